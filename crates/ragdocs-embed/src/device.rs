use candle_core::Device;
use tracing::{info, warn};

/// Pick the compute device named by the `device` setting, falling back to CPU.
pub fn select_device(preferred: &str) -> Device {
    if preferred.eq_ignore_ascii_case("metal") {
        #[cfg(feature = "metal")]
        {
            match Device::new_metal(0) {
                Ok(dev) => { info!("Device: Metal (MPS)"); return dev; }
                Err(e) => warn!(error = %e, "Metal unavailable, using CPU"),
            }
        }
        #[cfg(not(feature = "metal"))]
        warn!("Built without the `metal` feature, using CPU");
    }
    info!("Device: CPU");
    Device::Cpu
}
