//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;

pub const TAR_BLOCK: usize = 512;

/// One header found by [`scan_headers`]
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub name: String,
    pub size: u64,
    pub typeflag: u8,
    /// Offset of the first payload byte
    pub data_offset: usize,
}

/// What an extracted entry looked like
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Dir,
    File(Vec<u8>),
}

/// Deterministic, poorly compressible bytes
pub fn pseudo_random(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 33) as u8
        })
        .collect()
}

/// Build `root/name` with a small mixed tree
pub fn sample_tree(root: &Path, name: &str) {
    let base = root.join(name);
    fs::create_dir_all(base.join("nested/deeper")).unwrap();
    fs::create_dir_all(base.join("empty-dir")).unwrap();
    fs::write(base.join("hello.txt"), b"Hello, archive!\n").unwrap();
    fs::write(base.join("exact-block.bin"), pseudo_random(512, 1)).unwrap();
    fs::write(base.join("empty.txt"), b"").unwrap();
    fs::write(base.join("nested/odd.bin"), pseudo_random(1337, 2)).unwrap();
    fs::write(base.join("nested/deeper/big.bin"), pseudo_random(200_000, 3)).unwrap();
    fs::write(base.join("with space.txt"), b"spaces are fine").unwrap();
}

/// Build `root/name` with `files` files of `file_size` bytes each
pub fn bulk_tree(root: &Path, name: &str, files: usize, file_size: usize) {
    let base = root.join(name);
    fs::create_dir_all(&base).unwrap();
    for i in 0..files {
        fs::write(base.join(format!("chunk-{i:04}.bin")), pseudo_random(file_size, i as u64)).unwrap();
    }
}

/// Snapshot a directory the way an extracted archive should look
///
/// Keys are paths relative to `root`, directories with a trailing `/`.
pub fn snapshot(root: &Path, name: &str) -> BTreeMap<String, Node> {
    let mut out = BTreeMap::new();
    snapshot_into(root, Path::new(name), &mut out);
    out
}

fn snapshot_into(root: &Path, rel: &Path, out: &mut BTreeMap<String, Node>) {
    let full = root.join(rel);
    out.insert(format!("{}/", rel.display()), Node::Dir);
    for entry in fs::read_dir(&full).unwrap() {
        let entry = entry.unwrap();
        let child = rel.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            snapshot_into(root, &child, out);
        } else {
            out.insert(child.display().to_string(), Node::File(fs::read(root.join(&child)).unwrap()));
        }
    }
}

/// Read an uncompressed archive back with the `tar` crate
pub fn extract(data: &[u8]) -> BTreeMap<String, Node> {
    extract_ordered(data).into_iter().collect()
}

/// Entries in archive order
pub fn extract_ordered(data: &[u8]) -> Vec<(String, Node)> {
    let mut archive = tar::Archive::new(data);
    archive
        .entries()
        .unwrap()
        .map(|entry| {
            let mut entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().into_owned();
            let node = if entry.header().entry_type().is_dir() {
                Node::Dir
            } else {
                let mut content = Vec::new();
                entry.read_to_end(&mut content).unwrap();
                assert_eq!(content.len() as u64, entry.header().size().unwrap());
                Node::File(content)
            };
            (name, node)
        })
        .collect()
}

/// Entry names in archive order
pub fn entry_names(data: &[u8]) -> Vec<String> {
    extract_ordered(data).into_iter().map(|(name, _)| name).collect()
}

pub fn gunzip(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    flate2::read::GzDecoder::new(data).read_to_end(&mut out).unwrap();
    out
}

/// Parse a null-terminated C string from a tar header field
fn parse_cstr(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).trim().to_string()
}

/// Parse an octal number from a tar header field
fn parse_octal_u64(field: &[u8]) -> Option<u64> {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    let s = String::from_utf8_lossy(&field[..end]).trim().to_string();
    if s.is_empty() {
        return Some(0);
    }
    u64::from_str_radix(&s, 8).ok()
}

/// Round up to next 512-byte boundary
fn round_up_512(n: u64) -> u64 {
    n.div_ceil(512) * 512
}

/// Walk raw header blocks without interpreting extensions
///
/// Panics unless the archive ends with two zero blocks exactly at the end of
/// the data and every payload is followed by zero padding.
pub fn scan_headers(data: &[u8]) -> Vec<RawEntry> {
    let mut entries = Vec::new();
    let mut offset = 0usize;

    loop {
        let header = &data[offset..offset + TAR_BLOCK];

        // Check for end-of-archive marker (two consecutive zero blocks)
        if header.iter().all(|&b| b == 0) {
            let next = &data[offset + TAR_BLOCK..offset + 2 * TAR_BLOCK];
            assert!(next.iter().all(|&b| b == 0), "lone zero block at {offset}");
            assert_eq!(offset + 2 * TAR_BLOCK, data.len(), "data after end marker");
            break;
        }

        let name = parse_cstr(&header[0..100]);
        let size = parse_octal_u64(&header[124..136]).expect("bad size field");
        let data_offset = offset + TAR_BLOCK;
        let padded = round_up_512(size) as usize;

        let padding = &data[data_offset + size as usize..data_offset + padded];
        assert!(padding.iter().all(|&b| b == 0), "non-zero padding after {name}");

        entries.push(RawEntry {
            name,
            size,
            typeflag: header[156],
            data_offset,
        });
        offset = data_offset + padded;
    }

    entries
}

/// Open descriptors of this process that point below `dir`
///
/// Other tests run in parallel, so only descriptors inside `dir` are counted.
#[cfg(target_os = "linux")]
pub fn open_handles_under(dir: &Path) -> usize {
    let dir = dir.canonicalize().unwrap();
    fs::read_dir("/proc/self/fd")
        .unwrap()
        .filter_map(|fd| fd.ok())
        .filter_map(|fd| fs::read_link(fd.path()).ok())
        .filter(|target| target.starts_with(&dir))
        .count()
}
