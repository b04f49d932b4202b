// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 device discovery
//!
//! Lists `/dev/video*` nodes and reads their card and driver names with the
//! `VIDIOC_QUERYCAP` ioctl.

use super::types::DeviceInfo;
use crate::constants::VIDEO_DEVICE_PREFIX;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;
use tracing::debug;

/// VIDIOC_QUERYCAP ioctl number
const VIDIOC_QUERYCAP: libc::c_ulong = 0x80685600;

/// V4L2 capability structure for VIDIOC_QUERYCAP ioctl
#[repr(C)]
struct V4l2Capability {
    driver: [u8; 16],
    card: [u8; 32],
    bus_info: [u8; 32],
    version: u32,
    capabilities: u32,
    device_caps: u32,
    reserved: [u32; 3],
}

fn query_v4l2_cap(fd: RawFd) -> Option<V4l2Capability> {
    let mut cap: V4l2Capability = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(fd, VIDIOC_QUERYCAP as _, &mut cap as *mut V4l2Capability) };
    if result < 0 { None } else { Some(cap) }
}

/// Decode a NUL-padded C string field
fn c_field(bytes: &[u8]) -> String {
    let len = bytes.iter().position(|&c| c == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len]).trim().to_string()
}

/// Whether a `/dev` entry name is a video node (`video0`, `video12`, ...)
pub fn is_video_node(name: &str) -> bool {
    name.strip_prefix(VIDEO_DEVICE_PREFIX)
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

fn node_number(name: &str) -> u32 {
    name.strip_prefix(VIDEO_DEVICE_PREFIX)
        .and_then(|n| n.parse().ok())
        .unwrap_or(u32::MAX)
}

/// Video node names in `dir`, in numeric order
pub fn video_node_names(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names: Vec<String> = std::fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| is_video_node(name))
        .collect();
    names.sort_by_key(|name| node_number(name));
    Ok(names)
}

/// Build DeviceInfo for a device path
///
/// Card and driver are left empty when the node cannot be opened or does
/// not answer QUERYCAP.
pub fn build_device_info(device_path: &str) -> DeviceInfo {
    let cap = std::fs::File::open(device_path)
        .ok()
        .and_then(|file| query_v4l2_cap(file.as_raw_fd()));

    let (card, driver) = match cap {
        Some(cap) => (c_field(&cap.card), c_field(&cap.driver)),
        None => (String::new(), String::new()),
    };

    debug!(device_path, card = %card, driver = %driver, "Queried V4L2 capabilities");
    DeviceInfo {
        card,
        driver,
        path: device_path.to_string(),
    }
}

/// Every video node under `/dev`
pub fn enumerate_video_devices() -> std::io::Result<Vec<DeviceInfo>> {
    let dev = Path::new("/dev");
    Ok(video_node_names(dev)?
        .iter()
        .map(|name| build_device_info(&dev.join(name).to_string_lossy()))
        .collect())
}
