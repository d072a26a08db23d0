//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`PositionStore`] for the last settled tilt percentage.
//!
//! Record layout: namespace `"storage"`, key `"state"`, one `i32`.  The
//! same record earlier firmware wrote, so a device keeps its position
//! across a firmware swap.
//!
//! - **`target_os = "espidf"`**: ESP-IDF `nvs_*` calls, one commit per save.
//! - **`not(target_os = "espidf")`**: in-memory map for host tests and
//!   simulation.

use crate::app::ports::{PositionStore, StoreError};
use crate::app::state::TiltPercentage;
use log::info;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;
#[cfg(not(target_os = "espidf"))]
use std::sync::Mutex;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::warn;

const POSITION_NAMESPACE: &str = "storage";
const POSITION_KEY: &str = "state";

pub struct NvsPositionStore {
    #[cfg(not(target_os = "espidf"))]
    store: Mutex<HashMap<String, i32>>,
}

impl NvsPositionStore {
    /// Create the store and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, StoreError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES as esp_err_t
                || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as esp_err_t
            {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK as esp_err_t {
                    return Err(StoreError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK as esp_err_t {
                    return Err(StoreError::IoError);
                }
            } else if ret != ESP_OK as esp_err_t {
                return Err(StoreError::IoError);
            }
            info!("NvsPositionStore: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsPositionStore: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: Mutex::new(HashMap::new()),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// Overwrite the raw record (simulation only), e.g. to plant a corrupt value.
    #[cfg(not(target_os = "espidf"))]
    pub fn write_raw(&self, value: i32) {
        self.store
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(Self::composite_key(POSITION_NAMESPACE, POSITION_KEY), value);
    }

    /// Raw record as stored (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn read_raw(&self) -> Option<i32> {
        self.store
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&Self::composite_key(POSITION_NAMESPACE, POSITION_KEY))
            .copied()
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, esp_err_t>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, esp_err_t>,
    {
        let mut ns_buf = [0u8; 16];
        let ns_bytes = namespace.as_bytes();
        let len = ns_bytes.len().min(15);
        ns_buf[..len].copy_from_slice(&ns_bytes[..len]);

        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK as esp_err_t {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }
}

/// Map the raw record onto a position; out-of-range values are corrupt.
fn decode_record(raw: i32) -> Result<TiltPercentage, StoreError> {
    u8::try_from(raw)
        .ok()
        .and_then(TiltPercentage::new)
        .ok_or(StoreError::Corrupted)
}

impl PositionStore for NvsPositionStore {
    fn load(&self) -> Result<TiltPercentage, StoreError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let key = Self::composite_key(POSITION_NAMESPACE, POSITION_KEY);
            let raw = self
                .store
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .get(&key)
                .copied()
                .ok_or(StoreError::NotFound)?;
            decode_record(raw)
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(POSITION_NAMESPACE, false, |handle| {
                let key_cstr = b"state\0";
                let mut value: i32 = 0;
                let ret = unsafe { nvs_get_i32(handle, key_cstr.as_ptr() as *const _, &mut value) };
                if ret != ESP_OK as esp_err_t {
                    return Err(ret);
                }
                Ok(value)
            });
            match result {
                Ok(raw) => decode_record(raw),
                // Missing namespace and missing key both mean first boot.
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND as esp_err_t => Err(StoreError::NotFound),
                Err(e) => {
                    warn!("NVS: read of {}/{} failed ({})", POSITION_NAMESPACE, POSITION_KEY, e);
                    Err(StoreError::IoError)
                }
            }
        }
    }

    fn save(&self, tilt: TiltPercentage) -> Result<(), StoreError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let key = Self::composite_key(POSITION_NAMESPACE, POSITION_KEY);
            self.store
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .insert(key, i32::from(tilt.get()));
            info!("NvsPositionStore: saved {}", tilt);
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            Self::with_nvs_handle(POSITION_NAMESPACE, true, |handle| {
                let key_cstr = b"state\0";
                let ret = unsafe {
                    nvs_set_i32(handle, key_cstr.as_ptr() as *const _, i32::from(tilt.get()))
                };
                if ret != ESP_OK as esp_err_t {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK as esp_err_t {
                    return Err(ret);
                }
                Ok(())
            })
            .map_err(|e| {
                warn!("NVS: write of {}/{} failed ({})", POSITION_NAMESPACE, POSITION_KEY, e);
                StoreError::IoError
            })?;
            info!("NvsPositionStore: saved {}", tilt);
            Ok(())
        }
    }
}
