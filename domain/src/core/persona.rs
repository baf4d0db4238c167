//! Persona value object representing one of the fixed reasoning roles

use serde::{Deserialize, Serialize};

/// One of the three fixed reasoning personas (Value Object)
///
/// The set is closed: every run consults exactly these three personas,
/// and all reporting iterates them in [`Persona::ALL`] order.
///
/// # Example
///
/// ```
/// use council_domain::Persona;
///
/// let skeptic: Persona = "skeptic".parse().unwrap();
/// assert_eq!(skeptic, Persona::Skeptic);
/// assert_eq!(skeptic.others(), [Persona::Analyst, Persona::Advocate]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    /// Evidence-first reasoning: costs, data, feasibility
    Analyst,
    /// Adversarial reasoning: risks, failure modes, hidden assumptions
    Skeptic,
    /// Benefit-first reasoning: value delivered, opportunity cost of saying no
    Advocate,
}

impl Persona {
    /// All personas in deterministic enumeration order.
    pub const ALL: [Persona; 3] = [Persona::Analyst, Persona::Skeptic, Persona::Advocate];

    /// Number of personas taking part in every run.
    pub const COUNT: usize = Self::ALL.len();

    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::Analyst => "analyst",
            Persona::Skeptic => "skeptic",
            Persona::Advocate => "advocate",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Persona::Analyst => "Analyst",
            Persona::Skeptic => "Skeptic",
            Persona::Advocate => "Advocate",
        }
    }

    /// The two personas other than `self`, in enumeration order.
    pub fn others(&self) -> [Persona; 2] {
        match self {
            Persona::Analyst => [Persona::Skeptic, Persona::Advocate],
            Persona::Skeptic => [Persona::Analyst, Persona::Advocate],
            Persona::Advocate => [Persona::Analyst, Persona::Skeptic],
        }
    }
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Persona {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "analyst" => Ok(Persona::Analyst),
            "skeptic" => Ok(Persona::Skeptic),
            "advocate" => Ok(Persona::Advocate),
            other => Err(format!(
                "Unknown persona: {}. Valid: analyst, skeptic, advocate",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumeration_order_is_stable() {
        assert_eq!(
            Persona::ALL,
            [Persona::Analyst, Persona::Skeptic, Persona::Advocate]
        );
        let mut sorted = Persona::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, Persona::ALL.to_vec());
    }

    #[test]
    fn test_others_excludes_self() {
        for persona in Persona::ALL {
            let others = persona.others();
            assert_eq!(others.len(), 2);
            assert!(!others.contains(&persona));
        }
    }

    #[test]
    fn test_parse_roundtrip() {
        for persona in Persona::ALL {
            assert_eq!(persona.as_str().parse::<Persona>().ok(), Some(persona));
        }
        assert_eq!("  SKEPTIC ".parse::<Persona>().ok(), Some(Persona::Skeptic));
        assert!("moderator".parse::<Persona>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Persona::Advocate).unwrap();
        assert_eq!(json, "\"advocate\"");
    }
}
