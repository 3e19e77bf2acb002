use kasrisk_core::config::AppConfig;
use std::path::Path;

/// 环境变量前缀，层级以 `__` 分隔，例如 `KASRISK__SERVER__PORT=8080`
const ENV_PREFIX: &str = "KASRISK";

/// # Summary
/// 分层加载应用配置。
///
/// # Logic
/// 1. 以 `AppConfig::default()` 为底。
/// 2. 叠加可选的配置文件 (不存在时跳过)。
/// 3. 叠加 `KASRISK__*` 环境变量。
///
/// # Arguments
/// * `path`: 配置文件路径，格式由扩展名推断。
///
/// # Returns
/// 合并后的配置；文件或环境变量格式非法时返回错误。
pub fn load_config(path: &Path) -> Result<AppConfig, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

/// # Summary
/// 托管平台通过 `PORT` 注入监听端口时覆盖配置值。
///
/// # Arguments
/// * `config`: 待修改的配置。
/// * `port`: `PORT` 环境变量的原始值。
///
/// # Returns
/// 值非法时配置保持不变并返回错误描述，由调用方在日志就绪后记录。
pub fn apply_port_override(config: &mut AppConfig, port: Option<&str>) -> Result<(), String> {
    let Some(raw) = port else {
        return Ok(());
    };
    let parsed = raw
        .trim()
        .parse::<u16>()
        .map_err(|e| format!("invalid PORT value {:?}: {}", raw, e))?;
    config.server.port = parsed;
    Ok(())
}
