//! User-visible output and the `log` backend
//!
//! [`Logger`] prints headings, status lines and summaries for the command line
//! front end. Everything goes to stderr so stdout stays reserved for the
//! documents the tool produces. Installed with [`Logger::install`], it also
//! receives the `log` records emitted by the library.

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::time::{Duration, Instant};

/// Logger responsible for all user-visible output
#[derive(Debug, Clone)]
pub struct Logger {
    pub verbose: bool,
    pub quiet: bool,
    pub start_time: Option<Instant>,
}

impl Logger {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            quiet: false,
            start_time: Some(Instant::now()),
        }
    }

    pub fn new_quiet() -> Self {
        Self {
            verbose: false,
            quiet: true,
            start_time: Some(Instant::now()),
        }
    }

    /// Quiet wins over verbose.
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            Self::new_quiet()
        } else {
            Self::new(verbose)
        }
    }

    /// Level passed on to the `log` facade.
    pub fn level_filter(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Error
        } else if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        }
    }

    /// Register a copy of this logger as the global `log` backend.
    ///
    /// Returns `false` when another backend was installed first.
    pub fn install(&self) -> bool {
        let level = self.level_filter();
        match log::set_boxed_logger(Box::new(self.clone())) {
            Ok(()) => {
                log::set_max_level(level);
                true
            }
            Err(_) => false,
        }
    }

    /// Main section heading
    pub fn section(&self, title: &str) {
        if !self.quiet {
            eprintln!("\n=== {} ===", title);
        }
    }

    /// Sub-section heading
    pub fn subsection(&self, title: &str) {
        if !self.quiet {
            eprintln!("\n--- {} ---", title);
        }
    }

    pub fn trace(&self, message: &str) {
        if self.verbose && !self.quiet {
            eprintln!("🔍 TRACE: {}", message);
        }
    }

    pub fn debug(&self, message: &str) {
        if self.verbose && !self.quiet {
            eprintln!("🐛 DEBUG: {}", message);
        }
    }

    /// Information message
    pub fn info(&self, message: &str) {
        if !self.quiet {
            eprintln!("ℹ️  {}", message);
        }
    }

    /// Success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            eprintln!("✅ {}", message);
        }
    }

    /// Warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            eprintln!("⚠️  WARNING: {}", message);
        }
    }

    /// Error message, shown even when quiet
    pub fn error(&self, message: &str) {
        eprintln!("❌ ERROR: {}", message);
    }

    /// Detailed information (only shown in verbose mode)
    pub fn detail(&self, message: &str) {
        if self.verbose && !self.quiet {
            eprintln!("   {}", message);
        }
    }

    pub fn summary(&self, title: &str, items: &[String]) {
        if !self.quiet {
            eprintln!("\n📋 {}", title);
            eprintln!("{}", "─".repeat(title.chars().count() + 3));

            for item in items {
                eprintln!("  • {}", item);
            }

            if items.is_empty() {
                eprintln!("  (No items to display)");
            }
        }
    }

    /// Key-value pair summary display
    pub fn summary_kv(&self, title: &str, items: &[(&str, String)]) {
        if !self.quiet {
            self.subsection(title);
            for (key, value) in items {
                eprintln!("  {}: {}", key, value);
            }
        }
    }

    pub fn list(&self, title: &str, items: &[String]) {
        if !self.quiet {
            self.subsection(title);
            for (i, item) in items.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, item);
            }

            if items.is_empty() {
                eprintln!("  (No items to display)");
            }
        }
    }

    /// Time since the logger was created.
    pub fn elapsed(&self) -> Duration {
        self.start_time.map(|t| t.elapsed()).unwrap_or_default()
    }

    /// Format duration in human-readable format
    pub fn format_duration(&self, duration: Duration) -> String {
        let millis = duration.as_millis();
        if millis < 1000 {
            format!("{}ms", millis)
        } else {
            let secs = duration.as_secs();
            if secs < 60 {
                format!("{}.{}s", secs, (millis % 1000) / 100)
            } else {
                format!("{}m{}s", secs / 60, secs % 60)
            }
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level_filter()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = record.args().to_string();
        match record.level() {
            Level::Error => self.error(&message),
            Level::Warn => self.warning(&message),
            Level::Info => self.info(&message),
            Level::Debug => self.debug(&message),
            Level::Trace => self.trace(&message),
        }
    }

    fn flush(&self) {}
}
