//! docs.repo — A hosted source-code package, identified by (hosting, owner, name).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::docs_repos;

/// The fixed set of supported hosting providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hosting {
    Github,
}

impl Hosting {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hosting::Github => "github",
        }
    }
}

impl FromStr for Hosting {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "github" => Ok(Hosting::Github),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Hosting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = docs_repos)]
pub struct Repo {
    pub id: i64,
    pub hosting: String,
    pub owner: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Repo {
    /// "owner/name", as shown in logs and page titles.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = docs_repos)]
pub struct NewRepo {
    pub hosting: String,
    pub owner: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hosting_round_trips_through_str() {
        assert_eq!("github".parse::<Hosting>(), Ok(Hosting::Github));
        assert_eq!(Hosting::Github.as_str(), "github");
    }

    #[test]
    fn unknown_hosting_is_rejected() {
        assert!("gitlab".parse::<Hosting>().is_err());
        assert!("".parse::<Hosting>().is_err());
        assert!("GitHub".parse::<Hosting>().is_err());
    }
}
