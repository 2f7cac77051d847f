// opnsense-core: Resource lifecycle between opnsense-api and consumers (CLI).

pub mod config;
pub mod controller;
pub mod diagnostics;
pub mod error;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ControllerConfig, TlsVerification};
pub use controller::{Controller, Managed, Outcome};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{CoreError, Operation};

// Re-export model types at the crate root for ergonomics.
pub use opnsense_api::{
    Alias, AliasType, Category, Direction, FilterAction, FilterRule, InterfaceGroup, IpProtocol,
    ModelItem, NatReflection, NptRule, OneToOneRule, OneToOneType, RuleEndpoint, SearchRow,
    SourceNatRule, Template, TemplateSummary, Validations,
};
