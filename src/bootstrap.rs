//! Store bootstrap: probe the store, decide whether it is ours, then migrate
//! the version marker or seed the default authorization objects.

pub mod defaults;
pub mod gate;
pub mod initializer;
pub mod probe;
pub mod seeder;
pub mod version;

pub use defaults::{DefaultsError, PermissionBinding, ScopeDefinition, SeedDefaults};
pub use gate::{GateDecision, GateError, Gatekeeper};
pub use initializer::{
    InitError, InitReport, InitState, Initializer, InitializerConfig, Inspection,
};
pub use probe::{ProbeSnapshot, StoreProbe, TransactionError};
pub use seeder::{SeedError, SeedReport, SeedTask, Seeder};
pub use version::{VersionKeys, VersionWriteError, VersionWriter};
