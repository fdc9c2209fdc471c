//! Physical memory mapping for MMIO access
//!
//! Bank windows and the NEMC register block are mapped through /dev/mem.
//!
//! # Safety
//!
//! Accessing physical memory requires root privileges and can hang or
//! corrupt the machine when pointed at the wrong address. Accesses outside
//! the mapping panic.

use jznand_core::MmioWindow;

use crate::error::{PhysmapError, Result};

/// A mapped region of physical memory
#[cfg(target_os = "linux")]
pub struct PhysMap {
    ptr: *mut u8,
    /// Requested size, as seen by callers
    size: usize,
    /// Page-rounded size passed to mmap
    map_size: usize,
    phys_addr: u64,
}

#[cfg(target_os = "linux")]
impl PhysMap {
    /// Map `size` bytes of physical memory at `phys_addr`
    pub fn new(phys_addr: u64, size: usize) -> Result<Self> {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;
        use std::os::unix::io::AsRawFd;

        // O_SYNC for uncached access
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open("/dev/mem")
            .map_err(PhysmapError::DevMem)?;

        let page_mask = page_size() - 1;
        let offset = (phys_addr as usize) & page_mask;
        let aligned_addr = phys_addr & !(page_mask as u64);
        let map_size = (size + offset + page_mask) & !page_mask;

        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                map_size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                aligned_addr as libc::off_t,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(PhysmapError::MemoryMap {
                address: phys_addr,
                size,
                source: std::io::Error::last_os_error(),
            });
        }

        log::debug!(
            "mapped {:#x}+{:#x} ({:#x} bytes from {:#x})",
            phys_addr,
            size,
            map_size,
            aligned_addr
        );

        Ok(Self {
            ptr: unsafe { (ptr as *mut u8).add(offset) },
            size,
            map_size,
            phys_addr,
        })
    }

    /// Read a 32-bit register
    #[inline]
    pub fn read32(&self, offset: usize) -> u32 {
        assert!(offset + 4 <= self.size, "register offset {:#x} out of range", offset);
        debug_assert!(offset & 3 == 0, "unaligned 32-bit read");
        unsafe { core::ptr::read_volatile(self.ptr.add(offset) as *const u32) }
    }

    /// Write a 32-bit register
    #[inline]
    pub fn write32(&self, offset: usize, value: u32) {
        assert!(offset + 4 <= self.size, "register offset {:#x} out of range", offset);
        debug_assert!(offset & 3 == 0, "unaligned 32-bit write");
        unsafe { core::ptr::write_volatile(self.ptr.add(offset) as *mut u32, value) }
    }

    /// Physical address of the mapping
    pub fn phys_addr(&self) -> u64 {
        self.phys_addr
    }

    /// Size of the mapping
    pub fn size(&self) -> usize {
        self.size
    }
}

#[cfg(target_os = "linux")]
fn page_size() -> usize {
    unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize }
}

#[cfg(target_os = "linux")]
impl MmioWindow for PhysMap {
    #[inline]
    fn read8(&self, offset: usize) -> u8 {
        assert!(offset < self.size, "offset {:#x} outside the window", offset);
        unsafe { core::ptr::read_volatile(self.ptr.add(offset)) }
    }

    #[inline]
    fn write8(&self, offset: usize, value: u8) {
        assert!(offset < self.size, "offset {:#x} outside the window", offset);
        unsafe { core::ptr::write_volatile(self.ptr.add(offset), value) }
    }
}

#[cfg(target_os = "linux")]
impl Drop for PhysMap {
    fn drop(&mut self) {
        let offset = (self.phys_addr as usize) & (page_size() - 1);
        unsafe {
            libc::munmap(self.ptr.sub(offset) as *mut libc::c_void, self.map_size);
        }
    }
}

// MMIO registers have no aliasing concerns; all accesses are volatile
#[cfg(target_os = "linux")]
unsafe impl Send for PhysMap {}
#[cfg(target_os = "linux")]
unsafe impl Sync for PhysMap {}

/// Stub for non-Linux platforms
#[cfg(not(target_os = "linux"))]
pub struct PhysMap {
    _private: (),
}

#[cfg(not(target_os = "linux"))]
impl PhysMap {
    /// Always fails
    pub fn new(_phys_addr: u64, _size: usize) -> Result<Self> {
        Err(PhysmapError::NotSupported(
            "physical memory mapping only supported on Linux",
        ))
    }

    /// Unreachable
    pub fn read32(&self, _offset: usize) -> u32 {
        0
    }

    /// Unreachable
    pub fn write32(&self, _offset: usize, _value: u32) {}

    /// Unreachable
    pub fn phys_addr(&self) -> u64 {
        0
    }

    /// Unreachable
    pub fn size(&self) -> usize {
        0
    }
}

#[cfg(not(target_os = "linux"))]
impl MmioWindow for PhysMap {
    fn read8(&self, _offset: usize) -> u8 {
        0
    }
    fn write8(&self, _offset: usize, _value: u8) {}
}
