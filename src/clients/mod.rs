// Adapters over the external identity + database provider.
//
// Two clients with two distinct capability keys: the identity client holds
// the anon key and can only drive end-user auth flows; the data client holds
// the service-role key for server-authoritative reads and writes. Keeping
// the keys in separate newtypes means a privileged call cannot be issued
// from the auth path by accident.

pub mod data;
pub mod identity;

pub use data::{DataClient, DataError, PostgrestClient, Proposal};
pub use identity::{GoTrueClient, IdentityClient, IdentityError, ProviderUser};

/// Anon key: end-user auth calls only.
#[derive(Clone)]
pub struct AnonKey(pub String);

/// Service-role key: trusted data-plane calls only.
#[derive(Clone)]
pub struct AdminKey(pub String);
