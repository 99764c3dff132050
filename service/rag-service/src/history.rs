use generation_provider::generator::ChatTurn;

/// Saved question/answer turns of the session, oldest first.
#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    turns: Vec<ChatTurn>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&mut self, query: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(ChatTurn::new(query, answer));
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Turns whose query or answer contains `term`, ignoring case, with their
    /// zero-based position.
    pub fn search(&self, term: &str) -> Vec<(usize, &ChatTurn)> {
        let needle = term.to_lowercase();
        self.turns
            .iter()
            .enumerate()
            .filter(|(_, t)| t.query.to_lowercase().contains(&needle) || t.answer.to_lowercase().contains(&needle))
            .collect()
    }

    /// Plain-text transcript: `Q: ...`, `A: ...` and a blank line per turn.
    pub fn export(&self) -> String {
        self.turns.iter().map(|t| format!("Q: {}\nA: {}\n\n", t.query, t.answer)).collect()
    }
}
