//! Enumerations driving list queries and rendering

use serde::{Deserialize, Serialize};

/// Availability filter for the book list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    #[default]
    All,
    Available,
    Rented,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::All => "all",
            Availability::Available => "available",
            Availability::Rented => "rented",
        }
    }

    /// Value of the `available` query parameter; `All` sends none
    pub fn query_value(&self) -> Option<&'static str> {
        match self {
            Availability::All => None,
            Availability::Available => Some("true"),
            Availability::Rented => Some("false"),
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Availability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" | "" => Ok(Availability::All),
            "available" => Ok(Availability::Available),
            "rented" => Ok(Availability::Rented),
            _ => Err(format!("Invalid availability filter: {}", s)),
        }
    }
}

/// Display order of a rendered page, by publication date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOption {
    #[default]
    Newest,
    Oldest,
}

impl SortOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::Newest => "newest",
            SortOption::Oldest => "oldest",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortOption::Newest => "Newest First",
            SortOption::Oldest => "Oldest First",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            SortOption::Newest => SortOption::Oldest,
            SortOption::Oldest => SortOption::Newest,
        }
    }
}

impl std::fmt::Display for SortOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SortOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "newest" => Ok(SortOption::Newest),
            "oldest" => Ok(SortOption::Oldest),
            _ => Err(format!("Invalid sort option: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_query_value() {
        assert_eq!(Availability::All.query_value(), None);
        assert_eq!(Availability::Available.query_value(), Some("true"));
        assert_eq!(Availability::Rented.query_value(), Some("false"));
    }

    #[test]
    fn test_parse() {
        assert_eq!("Rented".parse::<Availability>(), Ok(Availability::Rented));
        assert!("lost".parse::<Availability>().is_err());
        assert_eq!("oldest".parse::<SortOption>(), Ok(SortOption::Oldest));
        assert_eq!(SortOption::Newest.toggled(), SortOption::Oldest);
    }
}
