//! Data models for the application.

mod member;
mod profile;

pub use member::{filter_members, Member, MemberDraft, MemberStatus};
pub use profile::{Mode, ProfileDraft, ProfilePatch, UserProfile};
