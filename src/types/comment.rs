/// One comment event pulled off the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingComment {
    /// Platform id without the kind prefix (e.g. `k2x9a1c`, not `t1_k2x9a1c`).
    pub id: String,
    /// `None` for deleted accounts.
    pub author: Option<String>,
    pub body: String,
    /// Fullname of the submission the comment belongs to (`t3_…`).
    pub link_id: String,
}

impl IncomingComment {
    pub fn is_authored_by(&self, username: &str) -> bool {
        self.author
            .as_deref()
            .is_some_and(|author| author.eq_ignore_ascii_case(username))
    }
}
