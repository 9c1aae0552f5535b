use rand::Rng;

type IdentifierInnerType = u16;

/// The 16-bit ICMP echo identifier used to correlate a reply with its
/// request. It is a correlation key, not a security token: unrelated
/// traffic merely fails to match.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct Identifier(pub IdentifierInnerType);

impl Identifier {
    /// A fresh random token. Preferred over the process id: two transactions
    /// in one process do not collide by construction of the caller, and the
    /// core stays free of ambient process state.
    pub fn random() -> Self {
        Identifier(rand::thread_rng().gen())
    }

    /// The calling process's id masked to 16 bits, the way the classic ping
    /// utilities derive their identifier.
    pub fn from_process() -> Self {
        Identifier((std::process::id() & 0xFFFF) as IdentifierInnerType)
    }
}

impl From<IdentifierInnerType> for Identifier {
    fn from(integer: IdentifierInnerType) -> Self {
        Identifier(integer)
    }
}

impl From<Identifier> for IdentifierInnerType {
    fn from(identifier: Identifier) -> Self {
        identifier.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}
