// opnsense-api: Async Rust client for the OPNsense REST management API

pub mod bimap;
pub mod client;
pub mod convert;
pub mod envelope;
pub mod error;
pub mod resources;
pub mod select;
pub mod transport;

pub use bimap::BiMap;
pub use client::{ApiResponse, Client, ClientConfig};
pub use envelope::{Validations, interpret_add_or_set, interpret_apply, interpret_delete};
pub use error::Error;
pub use resources::alias::{Alias, AliasType};
pub use resources::captive_portal::{Template, TemplateSummary};
pub use resources::category::Category;
pub use resources::filter::{Direction, FilterAction, FilterRule, IpProtocol};
pub use resources::group::InterfaceGroup;
pub use resources::npt::NptRule;
pub use resources::one_to_one::{NatReflection, OneToOneRule, OneToOneType};
pub use resources::source_nat::SourceNatRule;
pub use resources::{ModelItem, RuleEndpoint, SearchRow};
pub use select::{SelectField, SelectOption};
pub use transport::{TlsMode, TransportConfig};
