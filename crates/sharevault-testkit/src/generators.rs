//! Proptest generators for property-based testing.

use proptest::prelude::*;

use sharevault_core::{ContentId, GrantId, Owner, PasswordDigest};

/// Generate a random GrantId.
pub fn grant_id() -> impl Strategy<Value = GrantId> {
    any::<[u8; 32]>().prop_map(GrantId::from_bytes)
}

/// Generate a locally derived ContentId.
pub fn content_id() -> impl Strategy<Value = ContentId> {
    payload(256).prop_map(|data| ContentId::for_bytes(&data))
}

/// Generate an account-style owner address.
pub fn owner() -> impl Strategy<Value = Owner> {
    "0x[0-9a-f]{40}".prop_map(Owner::new)
}

/// Generate a non-empty printable password.
pub fn password() -> impl Strategy<Value = String> {
    "[ -~]{1,32}"
}

/// Generate an optional password digest.
pub fn password_digest() -> impl Strategy<Value = Option<PasswordDigest>> {
    proptest::option::of(password().prop_map(|p| PasswordDigest::of(&p)))
}

/// Generate a valid grant duration: one second up to ten years.
pub fn duration() -> impl Strategy<Value = u64> {
    1u64..=10 * 365 * 86_400
}

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Parameters for creating a share.
#[derive(Debug, Clone)]
pub struct ShareParams {
    pub content: Vec<u8>,
    pub password: Option<String>,
    pub duration_seconds: u64,
}

impl Arbitrary for ShareParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (payload(1024), proptest::option::of(password()), duration())
            .prop_map(|(content, password, duration_seconds)| ShareParams {
                content,
                password,
                duration_seconds,
            })
            .boxed()
    }
}

impl ShareParams {
    /// The password as the share API takes it.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}
