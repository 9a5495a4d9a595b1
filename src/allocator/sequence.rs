use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

const FIRST_PREFIX: &str = "AA";
const MAX_COUNTER: u8 = 99;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    #[error("sequence code `{value}` is malformed: {reason}")]
    Malformed { value: String, reason: &'static str },
}

/// Rolling student counter: an uppercase letter prefix followed by a
/// two-digit counter in `01..=99` (`AA01`, `AA02`, ... `AZ99`, `BA01`, ...).
///
/// Codes order by prefix width first, so `ZZ99 < AAA01`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SequenceCode {
    prefix: String,
    counter: u8,
}

impl SequenceCode {
    pub fn first() -> Self {
        Self {
            prefix: FIRST_PREFIX.to_string(),
            counter: 1,
        }
    }

    pub fn parse(raw: &str) -> Result<Self, SequenceError> {
        let malformed = |reason| SequenceError::Malformed {
            value: raw.to_string(),
            reason,
        };
        let split = raw
            .find(|ch: char| ch.is_ascii_digit())
            .ok_or_else(|| malformed("missing counter digits"))?;
        let (prefix, digits) = raw.split_at(split);
        if prefix.is_empty() {
            return Err(malformed("missing letter prefix"));
        }
        if !prefix.chars().all(|ch| ch.is_ascii_uppercase()) {
            return Err(malformed("prefix must be uppercase ASCII letters"));
        }
        if digits.len() != 2 || !digits.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(malformed("counter must be exactly two digits"));
        }
        let counter: u8 = digits
            .parse()
            .map_err(|_| malformed("counter must be exactly two digits"))?;
        if counter == 0 {
            return Err(malformed("counter must be in range 01..=99"));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            counter,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn counter(&self) -> u8 {
        self.counter
    }

    /// The code issued immediately after `self`.
    pub fn next(&self) -> Self {
        if self.counter < MAX_COUNTER {
            return Self {
                prefix: self.prefix.clone(),
                counter: self.counter + 1,
            };
        }
        Self {
            prefix: increment_prefix(&self.prefix),
            counter: 1,
        }
    }

    /// Next code after an optional last-issued code; `AA01` when nothing was issued.
    pub fn next_after(last: Option<&SequenceCode>) -> Self {
        match last {
            Some(code) => code.next(),
            None => Self::first(),
        }
    }
}

fn increment_prefix(prefix: &str) -> String {
    let mut letters: Vec<u8> = prefix.bytes().collect();
    let mut carry = true;
    for letter in letters.iter_mut().rev() {
        if *letter == b'Z' {
            *letter = b'A';
        } else {
            *letter += 1;
            carry = false;
            break;
        }
    }
    if carry {
        letters.insert(0, b'A');
    }
    letters.into_iter().map(char::from).collect()
}

impl Ord for SequenceCode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.prefix
            .len()
            .cmp(&other.prefix.len())
            .then_with(|| self.prefix.cmp(&other.prefix))
            .then_with(|| self.counter.cmp(&other.counter))
    }
}

impl PartialOrd for SequenceCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for SequenceCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{:02}", self.prefix, self.counter)
    }
}

impl TryFrom<String> for SequenceCode {
    type Error = SequenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SequenceCode> for String {
    fn from(value: SequenceCode) -> Self {
        value.to_string()
    }
}

impl std::str::FromStr for SequenceCode {
    type Err = SequenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
