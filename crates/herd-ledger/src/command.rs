//! Ledger commands
//!
//! Operation names arrive as strings from the transaction layer. They are
//! decoded exactly once into [`Command`] and matched exhaustively from there
//! on.

use herd_core::{CatalogKind, CowId, HerdError, OwnerId, Result, SensorId};
use tracing::debug;

/// A decoded ledger operation with typed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Seed (or reset) the three catalogs
    Init {
        /// Opaque seed value
        seed: String,
    },
    /// Register an owner
    RegisterOwner {
        /// Given name
        first_name: String,
        /// Family name
        last_name: String,
    },
    /// Register a cow under an existing owner
    RegisterCow {
        /// Owner of the cow
        owner_id: OwnerId,
        /// Sensor the cow reports through
        sensor_id: SensorId,
    },
    /// Insure a live cow
    GeneratePolicy {
        /// Cow to insure
        cow_id: CowId,
        /// Must be the cow's owner
        owner_id: OwnerId,
        /// Premium in whole currency units
        premium: u64,
        /// Payout in whole currency units
        value: u64,
    },
    /// Report a death through a sensor
    SensorTriggered {
        /// Reporting sensor
        sensor_id: SensorId,
    },
    /// Raw catalog read
    GetAll(CatalogKind),
    /// Raw read of any store key
    Read {
        /// Store key
        key: String,
    },
    /// Invariant report across all catalogs
    CheckConsistency,
}

const GET_ACTIVE_OWNERS: &str = "getActiveOwners";
const GET_ACTIVE_COWS: &str = "getActiveCows";
const GET_ACTIVE_POLICIES: &str = "getActivePolicies";
const READ: &str = "read";
const CHECK_CONSISTENCY: &str = "checkConsistency";

impl Command {
    /// Decode an operation name and its positional arguments.
    pub fn parse(operation: &str, args: &[String]) -> Result<Self> {
        let command = match operation {
            "init" => {
                let [seed] = expect_args::<1>(operation, args)?;
                Self::Init { seed }
            }
            "registerOwner" => {
                let [first_name, last_name] = expect_args::<2>(operation, args)?;
                Self::RegisterOwner {
                    first_name,
                    last_name,
                }
            }
            "registerCow" => {
                let [owner_id, sensor_id] = expect_args::<2>(operation, args)?;
                Self::RegisterCow {
                    owner_id: owner_id.into(),
                    sensor_id: sensor_id.into(),
                }
            }
            "generatePolicy" => {
                let [cow_id, owner_id, premium, value] = expect_args::<4>(operation, args)?;
                Self::GeneratePolicy {
                    cow_id: cow_id.into(),
                    owner_id: owner_id.into(),
                    premium: parse_amount("premium", &premium)?,
                    value: parse_amount("value", &value)?,
                }
            }
            "sensorTriggered" => {
                let [sensor_id] = expect_args::<1>(operation, args)?;
                Self::SensorTriggered {
                    sensor_id: sensor_id.into(),
                }
            }
            READ => {
                let [key] = expect_args::<1>(operation, args)?;
                Self::Read { key }
            }
            GET_ACTIVE_OWNERS | GET_ACTIVE_COWS | GET_ACTIVE_POLICIES | CHECK_CONSISTENCY => {
                if !args.is_empty() {
                    debug!(operation, ignored = args.len(), "Ignoring query arguments");
                }
                match operation {
                    GET_ACTIVE_OWNERS => Self::GetAll(CatalogKind::Owners),
                    GET_ACTIVE_COWS => Self::GetAll(CatalogKind::Cows),
                    GET_ACTIVE_POLICIES => Self::GetAll(CatalogKind::Policies),
                    _ => Self::CheckConsistency,
                }
            }
            other => return Err(HerdError::unknown_operation(other)),
        };
        Ok(command)
    }

    /// Wire name of the operation
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::RegisterOwner { .. } => "registerOwner",
            Self::RegisterCow { .. } => "registerCow",
            Self::GeneratePolicy { .. } => "generatePolicy",
            Self::SensorTriggered { .. } => "sensorTriggered",
            Self::GetAll(CatalogKind::Owners) => GET_ACTIVE_OWNERS,
            Self::GetAll(CatalogKind::Cows) => GET_ACTIVE_COWS,
            Self::GetAll(CatalogKind::Policies) => GET_ACTIVE_POLICIES,
            Self::Read { .. } => READ,
            Self::CheckConsistency => CHECK_CONSISTENCY,
        }
    }

    /// Whether the command only reads state
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            Self::GetAll(_) | Self::Read { .. } | Self::CheckConsistency
        )
    }
}

/// Whether `operation` names a read-only query.
///
/// Used to shape error payloads for names that failed to parse.
pub fn is_query_operation(operation: &str) -> bool {
    matches!(
        operation,
        GET_ACTIVE_OWNERS | GET_ACTIVE_COWS | GET_ACTIVE_POLICIES | READ | CHECK_CONSISTENCY
    )
}

fn expect_args<const N: usize>(operation: &str, args: &[String]) -> Result<[String; N]> {
    if args.len() != N {
        return Err(HerdError::argument(format!(
            "{operation} expects {N} argument{}, got {}",
            if N == 1 { "" } else { "s" },
            args.len()
        )));
    }
    Ok(std::array::from_fn(|i| args[i].clone()))
}

fn parse_amount(name: &str, raw: &str) -> Result<u64> {
    raw.trim().parse::<u64>().map_err(|_| {
        HerdError::argument(format!(
            "{name} must be a non-negative integer, got {raw:?}"
        ))
    })
}
