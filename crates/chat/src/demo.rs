/// Canned replies used when no API credential is configured.
///
/// Triggers are checked in order against the lowercased input; the first
/// keyword contained in the message wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoResponder {
    triggers: Vec<(String, String)>,
    fallback: String,
}

impl DemoResponder {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            triggers: Vec::new(),
            fallback: fallback.into(),
        }
    }

    /// Appends a trigger. Keywords are stored lowercased.
    pub fn with_trigger(mut self, keyword: impl Into<String>, reply: impl Into<String>) -> Self {
        self.triggers
            .push((keyword.into().to_lowercase(), reply.into()));
        self
    }

    pub fn reply(&self, input: &str) -> &str {
        let lowered = input.to_lowercase();
        self.triggers
            .iter()
            .find(|(keyword, _)| lowered.contains(keyword.as_str()))
            .map(|(_, reply)| reply.as_str())
            .unwrap_or(&self.fallback)
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }
}

impl Default for DemoResponder {
    fn default() -> Self {
        Self::new(
            "Vielen Dank für Ihre Nachricht. Im Live-Modus würde ich Ihnen eine detaillierte \
             Antwort geben. Bitte konfigurieren Sie den API-Key für die volle Funktionalität.",
        )
        .with_trigger("hallo", "Hallo! Wie kann ich Ihnen helfen?")
        .with_trigger(
            "hilfe",
            "Ich bin hier, um Ihnen zu helfen. Stellen Sie mir gerne Ihre Fragen!",
        )
        .with_trigger(
            "kontakt",
            "Sie können uns über das Kontaktformular auf dieser Seite erreichen.",
        )
    }
}
