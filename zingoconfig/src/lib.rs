#![forbid(unsafe_code)]
//! Configuration for a wallet maintenance session, and the logging it writes to.
use std::{
    io::{self, Error, ErrorKind},
    path::{Path, PathBuf},
};

use log::LevelFilter;
use log4rs::{
    append::rolling_file::{
        policy::compound::{
            roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger, CompoundPolicy,
        },
        RollingFileAppender,
    },
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};

pub const DEFAULT_LOGFILE_NAME: &str = "zingo-maintenance.debug.log";
pub const LOG_ROLL_WINDOW: u32 = 3;
pub const LOG_ROLL_SIZE_LIMIT: u64 = 5 * 1024 * 1024;

static LOG_INIT: std::sync::Once = std::sync::Once::new();

/// Install a stderr tracing subscriber. Calling this more than once is harmless.
pub fn init_logging() {
    LOG_INIT.call_once(|| {
        // another subscriber may already be installed by the host
        let _ = tracing_subscriber::fmt().try_init();
    });
}

/// Configuration data that is necessary and sufficient for running a maintenance session.
#[derive(Clone, Debug)]
pub struct MaintenanceConfig {
    /// When false, the session never evaluates the wallet.
    pub enabled: bool,
    /// The directory where logfiles will be created. By default, this will be in ~/.zcash on Linux and %APPDATA%\Zcash on Windows.
    pub data_dir: Option<PathBuf>,
    /// The filename of the logfile. This will be created in the `data_dir`.
    pub logfile_name: PathBuf,
    pub log_level: LevelFilter,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        MaintenanceConfigBuilder::default().create()
    }
}

impl MaintenanceConfig {
    pub fn builder() -> MaintenanceConfigBuilder {
        MaintenanceConfigBuilder::default()
    }

    pub fn get_data_dir(&self) -> io::Result<Box<Path>> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone().into_boxed_path());
        }

        #[cfg(any(target_os = "macos", target_os = "windows"))]
        {
            let mut location = dirs::data_dir().ok_or_else(|| {
                Error::new(ErrorKind::NotFound, "Couldn't determine app data directory")
            })?;
            location.push("Zcash");
            Ok(location.into_boxed_path())
        }

        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            let mut location = dirs::home_dir()
                .ok_or_else(|| Error::new(ErrorKind::NotFound, "Couldn't determine home dir"))?;
            location.push(".zcash");
            Ok(location.into_boxed_path())
        }
    }

    pub fn get_log_path(&self) -> io::Result<Box<Path>> {
        let mut log_path = self.get_data_dir()?.into_path_buf();
        log_path.push(&self.logfile_name);

        Ok(log_path.into_boxed_path())
    }

    /// Build the Logging config
    pub fn get_log_config(&self) -> io::Result<Config> {
        let log_path = self.get_log_path()?;
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let roller_pattern = format!("{}{{}}", log_path.to_string_lossy());
        let fixed_window_roller = FixedWindowRoller::builder()
            .build(&roller_pattern, LOG_ROLL_WINDOW)
            .map_err(|e| Error::new(ErrorKind::Other, format!("{}", e)))?;
        let size_trigger = SizeTrigger::new(LOG_ROLL_SIZE_LIMIT);
        let compound_policy =
            CompoundPolicy::new(Box::new(size_trigger), Box::new(fixed_window_roller));

        Config::builder()
            .appender(
                Appender::builder()
                    .filter(Box::new(ThresholdFilter::new(self.log_level)))
                    .build(
                        "logfile",
                        Box::new(
                            RollingFileAppender::builder()
                                .encoder(Box::new(PatternEncoder::new("{d} {l}::{m}{n}")))
                                .build(log_path, Box::new(compound_policy))?,
                        ),
                    ),
            )
            .build(
                Root::builder()
                    .appender("logfile")
                    .build(LevelFilter::Debug),
            )
            .map_err(|e| Error::new(ErrorKind::Other, format!("{}", e)))
    }

    /// Send `log` records, and tracing events through its `log` feature, to the rolling
    /// logfile. Takes the place of [`init_logging`], only one of the two can own the logger.
    pub fn init_file_logging(&self) -> io::Result<()> {
        let log_config = self.get_log_config()?;
        log4rs::init_config(log_config).map_err(|e| Error::new(ErrorKind::Other, e))?;

        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct MaintenanceConfigBuilder {
    pub enabled: bool,
    pub data_dir: Option<PathBuf>,
    pub logfile_name: Option<PathBuf>,
    pub log_level: LevelFilter,
}

impl Default for MaintenanceConfigBuilder {
    fn default() -> Self {
        MaintenanceConfigBuilder {
            enabled: true,
            data_dir: None,
            logfile_name: None,
            log_level: LevelFilter::Info,
        }
    }
}

impl MaintenanceConfigBuilder {
    pub fn set_enabled(&mut self, enabled: bool) -> &mut Self {
        self.enabled = enabled;
        self
    }

    pub fn set_data_dir(&mut self, dir: PathBuf) -> &mut Self {
        self.data_dir = Some(dir);
        self
    }

    pub fn set_logfile_name(&mut self, name: PathBuf) -> &mut Self {
        self.logfile_name = Some(name);
        self
    }

    pub fn set_log_level(&mut self, level: LevelFilter) -> &mut Self {
        self.log_level = level;
        self
    }

    pub fn create(&self) -> MaintenanceConfig {
        MaintenanceConfig {
            enabled: self.enabled,
            data_dir: self.data_dir.clone(),
            logfile_name: self
                .logfile_name
                .clone()
                .unwrap_or_else(|| DEFAULT_LOGFILE_NAME.into()),
            log_level: self.log_level,
        }
    }
}
