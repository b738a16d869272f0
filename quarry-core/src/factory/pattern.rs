//! Strings drawn from a `matches` pattern
//!
//! Patterns are parsed with `regex-syntax`, the same front end the `matches`
//! validator compiles through, and sampled with `rand_regex`. Look-around
//! assertions (anchors, word boundaries) are dropped before sampling, so a
//! sample is only a candidate: callers confirm it against the real pattern.

use rand::distributions::Distribution;
use rand::Rng;
use regex_syntax::hir::{Capture, Hir, HirKind, Repetition};
use thiserror::Error;

/// Repetitions allowed past the minimum of an open quantifier (`*`, `+`, `{n,}`)
pub const MAX_REPEAT: u32 = 8;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid pattern: {0}")]
    Syntax(#[from] regex_syntax::Error),

    #[error("pattern cannot be sampled: {0}")]
    Sample(String),
}

/// Sampler over the strings a pattern can produce
pub struct Pattern {
    sampler: rand_regex::Regex,
}

impl Pattern {
    pub fn parse(source: &str) -> Result<Self, PatternError> {
        let hir = regex_syntax::parse(source)?;
        let sampler = rand_regex::Regex::with_hir(without_looks(hir), MAX_REPEAT)
            .map_err(|e| PatternError::Sample(e.to_string()))?;
        Ok(Self { sampler })
    }

    /// One candidate, `None` if the sample is not valid UTF-8
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<String> {
        let bytes: Vec<u8> = Distribution::<Vec<u8>>::sample(&self.sampler, rng);
        String::from_utf8(bytes).ok()
    }
}

/// Replace every look-around assertion with the empty match
fn without_looks(hir: Hir) -> Hir {
    match hir.into_kind() {
        HirKind::Look(_) | HirKind::Empty => Hir::empty(),
        HirKind::Literal(literal) => Hir::literal(literal.0),
        HirKind::Class(class) => Hir::class(class),
        HirKind::Repetition(repetition) => Hir::repetition(Repetition {
            sub: Box::new(without_looks(*repetition.sub)),
            ..repetition
        }),
        HirKind::Capture(capture) => Hir::capture(Capture {
            sub: Box::new(without_looks(*capture.sub)),
            ..capture
        }),
        HirKind::Concat(subs) => Hir::concat(subs.into_iter().map(without_looks).collect()),
        HirKind::Alternation(subs) => Hir::alternation(subs.into_iter().map(without_looks).collect()),
    }
}

/// Draw up to `attempts` samples of `source` and return the first `accept`ed
///
/// Returns `None` when the pattern cannot be sampled or nothing was accepted.
pub fn generate_matching<R, F>(rng: &mut R, source: &str, attempts: usize, accept: F) -> Option<String>
where
    R: Rng + ?Sized,
    F: Fn(&str) -> bool,
{
    let pattern = match Pattern::parse(source) {
        Ok(pattern) => pattern,
        Err(e) => {
            log::debug!("Cannot sample /{}/: {}", source, e);
            return None;
        }
    };
    (0..attempts).filter_map(|_| pattern.generate(rng)).find(|candidate| accept(candidate))
}
