//! Record and user fixtures

use qualiflow::shared::{Document, User};

/// Account used across the sync scenarios
pub const RICHARD: &str = "p71x6d_richard";

pub fn richard() -> User {
    User {
        id: RICHARD.to_string(),
        email: "richard@formacert.fr".to_string(),
        nom: Some("Richard".to_string()),
        prenom: Some("Paul".to_string()),
        role: Some("admin".to_string()),
        date_creation: None,
    }
}

/// `count` documents owned by `owner`, ids `"{owner}-{n}"`
pub fn documents_for(owner: &str, count: usize) -> Vec<Document> {
    (1..=count)
        .map(|n| Document::new(format!("{}-{}", owner, n), owner, format!("Procédure {}", n)))
        .collect()
}
