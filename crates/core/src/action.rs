/// The operation a record is being validated for.
///
/// Rules can differ per operation (e.g. a login only carries credentials), so
/// every validator matches on this exhaustively.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Update,
    Login,
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Action::Create => f.write_str("create"),
            Action::Update => f.write_str("update"),
            Action::Login => f.write_str("login"),
        }
    }
}
