//! Session handling for the Abatedouro console.
//!
//! [`SessionGate`] owns the authentication state and the actions that
//! change it (bootstrap, login, register, logout). [`NavigationGuard`]
//! consults the gate before every navigation and [`Navigator`] drives it
//! over the console's [`RouteTable`].

pub mod constants;
mod error;
mod gate;
mod guard;
mod identity;
mod redirect;
mod routes;
mod types;

pub use constants::{ENTRY_PATH, HOME_PATH, MAX_GUARD_REDIRECTS, SESSION_COOKIE};
pub use error::{AuthError, IdentityError};
pub use gate::SessionGate;
pub use guard::{GuardDecision, NavigationError, NavigationGuard, Navigator};
pub use identity::{HttpIdentityService, IdentityService, SessionCookieFile};
pub use redirect::{FileRedirectSlot, MemoryRedirectSlot, RedirectSlot};
pub use routes::{Destination, Route, RouteMeta, RouteTable};
pub use types::{
    ApiMessage, Credentials, GateSnapshot, GateState, IdentityRecord, Registration,
    ServiceResponse, Session,
};
