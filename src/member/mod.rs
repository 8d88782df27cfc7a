//! Members, their credentials, and the pages for browsing and managing them.
//!
//! A member is an account holder in the organization. Each member has a role
//! (member, officer, or admin) and a verified flag that an admin flips once
//! they recognise the registration.

mod db;
mod directory;
mod domain;
mod manage;
mod password;
mod register;

pub use db::{
    count_members, create_member, create_member_table, delete_member, get_all_members,
    get_member_by_email, get_member_by_id, get_verified_members, set_member_role,
    set_member_verified,
};
pub use directory::{DirectoryState, get_directory_page};
pub use domain::{Member, MemberId, Role};
pub use manage::{
    ManageMembersState, delete_member_endpoint, get_members_page, update_member_role_endpoint,
    verify_member_endpoint,
};
pub use password::{PasswordHash, ValidatedPassword};
pub use register::{RegistrationState, get_register_page, register_member};
