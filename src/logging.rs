use log::LevelFilter;

/// Installs the platform logger. Safe to call more than once.
pub fn init(level: LevelFilter) {
    #[cfg(target_os = "android")]
    {
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(level)
                .with_tag("photox"),
        );
    }

    #[cfg(not(target_os = "android"))]
    {
        let result = env_logger::Builder::new()
            .filter_level(level)
            .parse_default_env()
            .try_init();
        if result.is_err() {
            log::debug!("Logger already initialized");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice() {
        init(LevelFilter::Debug);
        init(LevelFilter::Info);
        log::info!("logging initialized");
    }
}
