use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Nota libre adjunta a un tool. `edited` sólo se fija al modificar el texto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub text: String,
    pub author: String,
    pub created: DateTime<Utc>,
    pub edited: Option<DateTime<Utc>>,
}

impl Note {
    pub fn new(text: impl Into<String>, author: impl Into<String>) -> Self {
        Self { text: text.into(),
               author: author.into(),
               created: Utc::now(),
               edited: None }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.edited = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editing_sets_edited_timestamp() {
        let mut n = Note::new("check outliers", "ana");
        assert!(n.edited.is_none());
        n.set_text("outliers checked");
        assert_eq!(n.text, "outliers checked");
        assert!(n.edited.is_some_and(|e| e >= n.created));
    }
}
