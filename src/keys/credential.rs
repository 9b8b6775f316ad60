use std::fmt;
use zeroize::Zeroize;

/// Word counts BIP39 defines for 128 to 256 bits of entropy.
pub const MNEMONIC_WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

/// Whether `words` has the exact word count of a BIP39 phrase.
///
/// Other counts are deliberately not mnemonics: a 13-word phrase is almost
/// certainly a typo and must not silently derive an unrecoverable account.
pub fn is_mnemonic(words: &str) -> bool {
    MNEMONIC_WORD_COUNTS.contains(&words.split_whitespace().count())
}

/// A classified credential. The secret is zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub enum KeyCredential {
    /// No credential: a fresh key will be generated.
    None,
    /// An encoded private key (`0x` hex or base58).
    PrivateKeyEncoded(String),
    /// A mnemonic phrase, normalized to single spaces.
    Mnemonic(String),
}

impl KeyCredential {
    /// Classify a raw credential string. Never fails.
    pub fn classify(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self::None
        } else if is_mnemonic(trimmed) {
            Self::Mnemonic(trimmed.split_whitespace().collect::<Vec<_>>().join(" "))
        } else {
            Self::PrivateKeyEncoded(trimmed.to_string())
        }
    }

    /// Short tag used in mismatch errors and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::PrivateKeyEncoded(_) => "private key",
            Self::Mnemonic(_) => "mnemonic",
        }
    }
}

impl fmt::Debug for KeyCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // never print the secret itself
        write!(f, "KeyCredential({})", self.kind())
    }
}

impl Drop for KeyCredential {
    fn drop(&mut self) {
        match self {
            Self::PrivateKeyEncoded(s) | Self::Mnemonic(s) => s.zeroize(),
            Self::None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PHRASE_12: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn empty_is_none() {
        assert_eq!(KeyCredential::classify(""), KeyCredential::None);
        assert_eq!(KeyCredential::classify("   \n"), KeyCredential::None);
    }

    #[test]
    fn twelve_words_is_mnemonic_and_normalized() {
        let messy = PHRASE_12.replace(' ', "  \t");
        match KeyCredential::classify(&messy) {
            KeyCredential::Mnemonic(ref p) => assert_eq!(p, PHRASE_12),
            ref other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn single_token_is_private_key() {
        let cred = KeyCredential::classify("0x4f3c");
        assert_eq!(cred.kind(), "private key");
    }

    #[test]
    fn debug_hides_secret() {
        let cred = KeyCredential::classify(PHRASE_12);
        let shown = format!("{cred:?}");
        assert!(!shown.contains("abandon"));
    }

    proptest! {
        #[test]
        fn invalid_word_counts_never_classify_as_mnemonic(
            n in (1usize..40).prop_filter("valid count", |n| !MNEMONIC_WORD_COUNTS.contains(n))
        ) {
            let phrase = vec!["zoo"; n].join(" ");
            let cred = KeyCredential::classify(&phrase);
            prop_assert_ne!(cred.kind(), "mnemonic");
        }

        #[test]
        fn valid_word_counts_classify_as_mnemonic(idx in 0usize..5) {
            let phrase = vec!["zoo"; MNEMONIC_WORD_COUNTS[idx]].join(" ");
            prop_assert_eq!(KeyCredential::classify(&phrase).kind(), "mnemonic");
        }
    }
}
