use clap::ValueEnum;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum AiProvider {
    /// 擬似モデル（外部呼び出しなし）
    #[default]
    Simulated,
    Claude,
    Codex,
    Gemini,
}

impl AiProvider {
    /// 外部CLIのコマンド名（擬似モデルはNone）
    pub fn command_name(&self) -> Option<&'static str> {
        match self {
            AiProvider::Simulated => None,
            AiProvider::Claude => Some("claude"),
            AiProvider::Codex => Some("codex"),
            AiProvider::Gemini => Some("gemini"),
        }
    }

    /// 非対話モードでプロンプトを渡す引数
    pub fn command_args(&self, prompt: &str, model: Option<&str>) -> Vec<String> {
        let mut args: Vec<String> = match self {
            AiProvider::Simulated => Vec::new(),
            AiProvider::Claude => vec!["-p".into(), prompt.into(), "--output-format".into(), "text".into()],
            AiProvider::Codex => vec!["exec".into(), prompt.into()],
            AiProvider::Gemini => vec!["-p".into(), prompt.into()],
        };

        if let (Some(model), Some(_)) = (model, self.command_name()) {
            args.push("--model".into());
            args.push(model.into());
        }
        args
    }
}
