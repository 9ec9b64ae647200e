use clap::Parser;
use propconv::config::Command;
use propconv::utils::{logger, validation::Validate};
use propconv::{CliConfig, ConversionRegistry, PropertyBinder, PropertyError, PropertyFile, RawValue};

fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::debug!("CLI config: {:?}", config);

    // 執行命令，失敗時輸出錯誤與建議
    if let Err(e) = run(&config) {
        tracing::error!("❌ {}", e);
        eprintln!("❌ {}", e);
        if let Some(cause) = std::error::Error::source(&e) {
            eprintln!("   caused by: {}", cause);
        }
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }
}

fn run(config: &CliConfig) -> Result<(), PropertyError> {
    let registry = ConversionRegistry::default();

    match &config.command {
        Command::Bind { config: path, json } => {
            tracing::info!("📁 Loading properties from: {}", path);
            let file = PropertyFile::from_file(path)?;
            file.validate()?;

            let binder = PropertyBinder::new(registry);
            tracing::debug!("Using {:?}", binder.service());
            let bound = binder.bind(&file.fields, &file)?;
            tracing::info!("✅ Bound {} fields", bound.len());

            if *json {
                println!("{}", serde_json::to_string_pretty(&bound.to_json()?)?);
            } else {
                for field in bound.fields() {
                    match &field.value {
                        Some(value) => println!("{} = {}", field.name, value),
                        None => println!("{} = <unset>", field.name),
                    }
                }
            }
        }
        Command::Convert { target, value } => {
            // 沒有專用轉換器時交給通用轉換
            if !registry.has_converter(target) {
                tracing::debug!("No dedicated converter for {}, using fallback", target);
            }
            match registry.convert_value(target, &RawValue::from(value.as_str()))? {
                Some(converted) => println!("{}", converted),
                None => {
                    tracing::warn!("'{}' is not a valid {}", value, target);
                    println!("<absent>");
                }
            }
        }
    }

    Ok(())
}
