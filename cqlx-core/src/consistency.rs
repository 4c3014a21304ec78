use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::Error;

/// Refer to [Cassandra documentation] for the meaning of each consistency level.
///
/// The default consistency level is `QUORUM`, applied to every statement built from
/// literal query text unless [`StatementOptions::consistency`] says otherwise.
///
/// [Cassandra documentation]: https://cassandra.apache.org/doc/latest/cassandra/architecture/dynamo.html#tunable-consistency
/// [`StatementOptions::consistency`]: crate::options::StatementOptions::consistency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Consistency {
    Any,
    One,
    Two,
    Three,
    #[default]
    Quorum,
    All,
    LocalQuorum,
    EachQuorum,
    Serial,
    LocalSerial,
    LocalOne,
}

impl Consistency {
    /// The level's name as CQL spells it, e.g. `LOCAL_QUORUM`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Consistency::Any => "ANY",
            Consistency::One => "ONE",
            Consistency::Two => "TWO",
            Consistency::Three => "THREE",
            Consistency::Quorum => "QUORUM",
            Consistency::All => "ALL",
            Consistency::LocalQuorum => "LOCAL_QUORUM",
            Consistency::EachQuorum => "EACH_QUORUM",
            Consistency::Serial => "SERIAL",
            Consistency::LocalSerial => "LOCAL_SERIAL",
            Consistency::LocalOne => "LOCAL_ONE",
        }
    }

    /// Serial levels only apply to the Paxos phase of lightweight transactions.
    pub fn is_serial(&self) -> bool {
        matches!(self, Consistency::Serial | Consistency::LocalSerial)
    }
}

impl Display for Consistency {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Consistency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Ok(match &*s.to_ascii_lowercase() {
            "any" => Consistency::Any,
            "one" => Consistency::One,
            "two" => Consistency::Two,
            "three" => Consistency::Three,
            "quorum" => Consistency::Quorum,
            "all" => Consistency::All,
            "local_quorum" => Consistency::LocalQuorum,
            "each_quorum" => Consistency::EachQuorum,
            "serial" => Consistency::Serial,
            "local_serial" => Consistency::LocalSerial,
            "local_one" => Consistency::LocalOne,

            _ => {
                return Err(Error::config(format!("unknown value {s:?} for `consistency`")));
            }
        })
    }
}
