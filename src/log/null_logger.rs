//! Built without the `logging` feature: nothing is installed, but the configuration API still
//! works and `log::max_level` tracks the global level so disabled messages cost nothing.

use crate::log::LogConfiguration;

impl LogConfiguration {
    pub(in crate::log) fn set_config(&mut self) {
        log::set_max_level(self.global_log_level);
    }
}
