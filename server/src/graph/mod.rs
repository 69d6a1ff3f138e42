//! Microsoft Graph plumbing.
//!
//! This module provides:
//! - App-only token acquisition (client-credentials grant)
//! - The REST calls used for profile reads and account provisioning
//! - Tenant verified-domain selection with process-lifetime caching

mod client;
mod domain;
mod token;

pub use client::{
    CreatedUser, GraphClient, GraphError, GraphUser, Invitation, InvitationResult, InvitedUser,
    NewUser, PasswordProfile, VerifiedDomain,
};
pub use domain::{select_domain, DomainCache};
pub use token::{TokenError, TokenProvider, GRAPH_DEFAULT_SCOPE};
