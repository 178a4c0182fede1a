use ratebench_limiters::{
    BoxedSource, BurstOnlyReader, DebitBucketReader, IntervalReader, LeakyBucketReader,
    TokenBucketReader,
};
use serde::{Deserialize, Serialize};

/// The closed set of limiting strategies under test.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ReaderKind {
    TokenBucket,
    DebitBucket,
    LeakyBucket,
    Interval,
    /// Token bucket that only reads in full bursts. Shown in the usage demo, not benchmarked.
    TokenBucketBursts,
}

impl ReaderKind {
    pub const ALL: [ReaderKind; 4] = [
        ReaderKind::TokenBucket,
        ReaderKind::DebitBucket,
        ReaderKind::LeakyBucket,
        ReaderKind::Interval,
    ];

    /// Readers shown by the usage demo.
    pub const USAGE: [ReaderKind; 5] = [
        ReaderKind::TokenBucket,
        ReaderKind::TokenBucketBursts,
        ReaderKind::DebitBucket,
        ReaderKind::LeakyBucket,
        ReaderKind::Interval,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Self::TokenBucket => "Token Bucket",
            Self::DebitBucket => "Debit Bucket",
            Self::LeakyBucket => "Leaky Bucket",
            Self::Interval => "Fixed Interval",
            Self::TokenBucketBursts => "Token Bucket (Bursts Only)",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::TokenBucket => "#5470c6",
            Self::DebitBucket => "#ea7ccc",
            Self::LeakyBucket => "#fac858",
            Self::Interval => "#ee6666",
            Self::TokenBucketBursts => "#91cc75",
        }
    }

    /// Wraps `source` so reads release at most `bytes_per_sec` bytes per second.
    pub fn wrap(self, source: BoxedSource, buffer_size: usize, bytes_per_sec: u64) -> BoxedSource {
        match self {
            Self::TokenBucket => Box::new(TokenBucketReader::new(
                source,
                buffer_size,
                bytes_per_sec,
            )),
            Self::DebitBucket => Box::new(DebitBucketReader::new(source, bytes_per_sec)),
            Self::LeakyBucket => Box::new(LeakyBucketReader::new(
                source,
                buffer_size,
                bytes_per_sec,
            )),
            Self::Interval => Box::new(IntervalReader::new(source, bytes_per_sec)),
            Self::TokenBucketBursts => Box::new(BurstOnlyReader::new(
                source,
                buffer_size,
                bytes_per_sec,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn identities_round_trip_through_their_string_form() {
        for kind in ReaderKind::USAGE {
            let parsed: ReaderKind = kind
                .to_string()
                .parse()
                .unwrap_or_else(|err| panic!("failed to parse `{kind}`: {err}"));
            assert_eq!(parsed, kind);
        }
        assert_eq!(ReaderKind::DebitBucket.to_string(), "debit-bucket");
        assert_eq!(
            ReaderKind::TokenBucketBursts.to_string(),
            "token-bucket-bursts"
        );
    }

    #[test]
    fn display_colors_are_distinct() {
        let colors: HashSet<_> = ReaderKind::USAGE.iter().map(|k| k.color()).collect();
        assert_eq!(colors.len(), ReaderKind::USAGE.len());
    }
}
