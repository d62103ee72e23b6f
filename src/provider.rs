#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Provider {
    #[default]
    #[value(name = "openai")]
    OpenAI,
    Llama,
    Gemma,
}

impl Provider {
    /// Identifier sent to the backend in the `provider` field
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Llama => "llama",
            Provider::Gemma => "gemma",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Some(Provider::OpenAI),
            "llama" => Some(Provider::Llama),
            "gemma" => Some(Provider::Gemma),
            _ => None,
        }
    }

    pub fn all() -> Vec<Provider> {
        vec![Provider::OpenAI, Provider::Llama, Provider::Gemma]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OpenAI (GPT)",
            Provider::Llama => "Llama (Meta)",
            Provider::Gemma => "Gemma (Google)",
        }
    }

    pub fn next(&self) -> Provider {
        let all = Self::all();
        let i = all.iter().position(|p| p == self).unwrap_or(0);
        all[(i + 1) % all.len()]
    }

    pub fn prev(&self) -> Provider {
        let all = Self::all();
        let i = all.iter().position(|p| p == self).unwrap_or(0);
        all[(i + all.len() - 1) % all.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!(Provider::from_str("LLaMA"), Some(Provider::Llama));
        assert_eq!(Provider::from_str(" gemma "), Some(Provider::Gemma));
        assert_eq!(Provider::from_str("claude"), None);
    }

    #[test]
    fn test_cli_names_match_wire_names() {
        use clap::ValueEnum;

        for provider in Provider::all() {
            let value = provider.to_possible_value().unwrap();
            assert_eq!(value.get_name(), provider.as_str());
        }
    }

    #[test]
    fn test_cycling_wraps_around() {
        assert_eq!(Provider::Gemma.next(), Provider::OpenAI);
        assert_eq!(Provider::OpenAI.prev(), Provider::Gemma);
        assert_eq!(Provider::Llama.next().prev(), Provider::Llama);
    }
}
