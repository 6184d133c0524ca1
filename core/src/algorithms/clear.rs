// Clear-method overwrite of a whole block device: random, zero, random,
// first to last addressable byte. A pass counts only once `sync_all`
// returns.

use super::{run_passes, FileMedium, PassContext, PassFailure, Pattern, WipeMedium};
use crate::error::{EraseError, EraseResult};
use crate::{EraseReport, TargetKind};
use std::fs::{self, OpenOptions};
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::path::Path;

pub struct ClearWipe;

impl ClearWipe {
    pub const PLAN: [Pattern; 3] = [Pattern::Random, Pattern::Zero, Pattern::Random];

    pub fn wipe(device: &Path, ctx: &mut PassContext<'_>) -> EraseResult<EraseReport> {
        let meta = fs::metadata(device).map_err(|e| EraseError::from_io(device, e))?;
        let file_type = meta.file_type();
        if file_type.is_dir() {
            return Err(EraseError::UnsupportedTarget {
                path: device.to_path_buf(),
                reason: "a directory is not a block device".to_string(),
            });
        }

        let mut open = OpenOptions::new();
        open.write(true);
        if file_type.is_block_device() {
            // Exclusive open fails with EBUSY while anything has it mounted
            open.custom_flags(libc::O_EXCL);
        } else {
            tracing::warn!(
                device = %device.display(),
                "Target is not a block device; overwriting it as a disk image"
            );
        }
        let file = open.open(device).map_err(|e| EraseError::from_io(device, e))?;

        let mut medium = FileMedium::new(file);
        let bytes = Self::overwrite(&mut medium, device, ctx)?;

        Ok(EraseReport {
            passes_completed: Self::PLAN.len() as u32,
            bytes_overwritten: bytes,
            ..EraseReport::empty(TargetKind::BlockDevice)
        })
    }

    pub fn overwrite(
        medium: &mut dyn WipeMedium,
        device: &Path,
        ctx: &mut PassContext<'_>,
    ) -> EraseResult<u64> {
        run_passes(medium, device, &Self::PLAN, ctx).map_err(|failure| match failure {
            PassFailure::Cancelled { completed } => EraseError::WipeCancelled {
                path: device.to_path_buf(),
                passes_completed: completed,
            },
            PassFailure::Io {
                pass,
                completed,
                source,
            } => {
                tracing::error!(
                    device = %device.display(),
                    pass,
                    completed,
                    error = %source,
                    "Device pass failed"
                );
                EraseError::DeviceWipeFailed {
                    device: device.to_path_buf(),
                    pass,
                    total_passes: Self::PLAN.len() as u32,
                    passes_completed: completed,
                    source,
                }
            }
        })
    }
}
