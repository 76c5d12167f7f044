//! CLI commands for provider discovery, options and provisioning.

use {
    anyhow::Context,
    serde_json::{Map, Value},
    tessera_config::TesseraConfig,
    tessera_providers::{CommandInstaller, ProviderCatalog, ProviderHandle, ProviderLoader},
    tracing::warn,
};

fn loader(config: &TesseraConfig) -> ProviderLoader {
    ProviderLoader::from_config(ProviderCatalog::with_builtins(), &config.providers)
}

/// Description from the provider file; unreadable files are logged and skipped.
fn description(loader: &ProviderLoader, name: &str) -> Option<String> {
    match loader.manifest(name) {
        Ok(manifest) => manifest.description,
        Err(e) => {
            warn!(provider = %name, error = %e, "failed to read provider file");
            None
        },
    }
}

/// Parse repeated `key=value` flags. Values that parse as JSON keep their
/// type (`max_tokens=256`, `requirements=["numpy"]`); anything else is a string.
pub fn parse_set_args(pairs: &[String]) -> anyhow::Result<Map<String, Value>> {
    let mut args = Map::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .with_context(|| format!("expected KEY=VALUE, got '{pair}'"))?;
        let key = key.trim();
        anyhow::ensure!(!key.is_empty(), "empty key in '{pair}'");
        let value =
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        args.insert(key.to_string(), value);
    }
    Ok(args)
}

/// Config settings for `name`, overlaid by `--set` flags.
fn provider_args(
    config: &TesseraConfig,
    name: &str,
    pairs: &[String],
) -> anyhow::Result<Map<String, Value>> {
    let mut args = config.providers.settings_for(name);
    args.extend(parse_set_args(pairs)?);
    Ok(args)
}

fn load(config: &TesseraConfig, name: &str, pairs: &[String]) -> anyhow::Result<ProviderHandle> {
    let args = provider_args(config, name, pairs)?;
    Ok(loader(config).load(name, args)?)
}

pub fn list(config: &TesseraConfig, json: bool) -> anyhow::Result<()> {
    let loader = loader(config);
    let names = loader.available();

    if json {
        let entries: Vec<Value> = names
            .iter()
            .map(|name| {
                serde_json::json!({
                    "name": name,
                    "registered": loader.catalog().contains(name),
                    "description": description(&loader, name),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if names.is_empty() {
        println!("No providers found in {}.", loader.dir().root().display());
        println!(
            "Registered providers: {}",
            loader.catalog().ids().join(", ")
        );
        return Ok(());
    }

    for name in &names {
        let status = if loader.catalog().contains(name) {
            "✓"
        } else {
            "✗"
        };
        match description(&loader, name) {
            Some(text) => println!("  {status} {name:<12} {text}"),
            None => println!("  {status} {name}"),
        }
    }
    Ok(())
}

pub fn options(config: &TesseraConfig, name: &str) -> anyhow::Result<()> {
    let options = loader(config).options(name)?;
    println!("{}", serde_json::to_string_pretty(&options)?);
    Ok(())
}

pub async fn provision(
    config: &TesseraConfig,
    name: &str,
    pairs: &[String],
    dry_run: bool,
) -> anyhow::Result<()> {
    let handle = load(config, name, pairs)?;
    let installer = CommandInstaller::from_config(&config.installer);

    if handle.requirements().is_empty() {
        println!("{name} declares no requirements.");
        return Ok(());
    }

    if dry_run {
        let plan = handle.plan(&installer).await?;
        for requirement in &plan.present {
            println!("  ✓ {requirement}");
        }
        for requirement in &plan.missing {
            println!(
                "  ✗ {requirement}  ({})",
                installer.install_command_preview(requirement)
            );
        }
        return Ok(());
    }

    let report = handle.provision(&installer).await?;
    for requirement in &report.already_present {
        println!("  ✓ {requirement} (already installed)");
    }
    for requirement in &report.installed {
        println!("  ✓ {requirement} (installed)");
    }
    Ok(())
}

pub async fn instruct(
    config: &TesseraConfig,
    name: &str,
    prompt: &str,
    tokens: usize,
    pairs: &[String],
    provision: bool,
) -> anyhow::Result<()> {
    let handle = load(config, name, pairs)?;
    if provision {
        let installer = CommandInstaller::from_config(&config.installer);
        handle.provision(&installer).await?;
    }
    let reply = handle.instruct(prompt, tokens).await?;
    println!("{reply}");
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    fn pairs(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn set_values_keep_json_types() {
        let args = parse_set_args(&pairs(&[
            "max_tokens=256",
            "model=gpt-4o",
            "requirements=[\"numpy\"]",
            "temperature=0.2",
            "note=a=b",
        ]))
        .unwrap();
        assert_eq!(args["max_tokens"], json!(256));
        assert_eq!(args["model"], json!("gpt-4o"));
        assert_eq!(args["requirements"], json!(["numpy"]));
        assert_eq!(args["temperature"], json!(0.2));
        assert_eq!(args["note"], json!("a=b"));
    }

    #[test]
    fn set_rejects_missing_separator() {
        assert!(parse_set_args(&pairs(&["model"])).is_err());
        assert!(parse_set_args(&pairs(&["=x"])).is_err());
    }

    #[test]
    fn flags_override_config_settings() {
        let config: TesseraConfig = serde_json::from_value(json!({
            "providers": { "settings": { "echo": { "prefix": "cfg", "keep": true } } }
        }))
        .unwrap();
        let args = provider_args(&config, "Echo", &pairs(&["prefix=flag"])).unwrap();
        assert_eq!(args["prefix"], json!("flag"));
        assert_eq!(args["keep"], json!(true));
    }

    fn config_in(dir: &std::path::Path) -> TesseraConfig {
        let mut config = TesseraConfig::default();
        config.providers.dir = dir.to_path_buf();
        config
    }

    #[tokio::test]
    async fn instruct_runs_echo_provider() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("echo.toml"), "").unwrap();
        let config = config_in(tmp.path());
        let handle = load(&config, "echo", &pairs(&["prefix=> "])).unwrap();
        assert_eq!(handle.instruct("hi", 0).await.unwrap(), "> hi");
    }

    #[test]
    fn provider_without_file_cannot_load() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config_in(tmp.path());
        assert!(load(&config, "echo", &[]).is_err());
    }

    #[test]
    fn description_comes_from_provider_file() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("echo.toml"),
            "description = \"Repeats the prompt\"\n",
        )
        .unwrap();
        std::fs::write(tmp.path().join("openai.toml"), "").unwrap();
        let loader = loader(&config_in(tmp.path()));
        assert_eq!(
            description(&loader, "echo").as_deref(),
            Some("Repeats the prompt")
        );
        assert_eq!(description(&loader, "openai"), None);
    }
}
