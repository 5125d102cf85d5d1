// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Discovery cache and runtime face management

mod common;

use common::{system, MockBackend, SharedStore};
use kas_font_cache::fonts::{Charset, FaceFlags, FontSystem, FontWeight, UNUSED_CACHE_SIZE};
use kas_font_cache::store::{ConfigStore, MemoryStore};
use kas_font_cache::{LogFont, Matrix};
use std::path::Path;

fn start(backend: &MockBackend, store: &SharedStore) -> FontSystem {
    FontSystem::new(Box::new(backend.clone()), Box::new(store.clone()))
}

fn style_names(store: &SharedStore, key: &str) -> Vec<String> {
    store.values(key).into_iter().map(|(name, _)| name).collect()
}

#[test]
fn scanned_faces_are_restored() {
    let store = SharedStore::new(MemoryStore::new());
    let backend = MockBackend::new(common::faces());
    let first = start(&backend, &store);
    assert_eq!(backend.discovers(), 1);
    assert_eq!(style_names(&store, "Fonts/Cache/Arial"), ["Bold", "Regular"]);
    assert!(store.has_key("Fonts/Cache/@MS Gothic"));
    assert!(store.has_key("Fonts/Cache/Fixedsys/10"));
    let num_faces = first.with_registry(|reg| reg.num_faces());
    drop(first);

    let backend = MockBackend::new(common::faces());
    let second = start(&backend, &store);
    assert_eq!(backend.discovers(), 0);
    assert_eq!(second.with_registry(|reg| reg.num_faces()), num_faces);

    let lf = LogFont::new("Fixedsys", 26, Charset::ANSI);
    let handle = second.resolve_or_create(&lf, &Matrix::IDENTITY, true).unwrap();
    let info = second.font_info(handle).unwrap();
    assert!(!info.scalable);
    assert_eq!(info.scale_y, 2);

    let lf = LogFont::new("@MS Gothic", -16, Charset::SHIFTJIS);
    let handle = second.resolve_or_create(&lf, &Matrix::IDENTITY, false).unwrap();
    assert_eq!(second.font_info(handle).unwrap().full_name, "@MS Gothic");
}

#[test]
fn removed_files_leave_the_cache() {
    let store = SharedStore::new(MemoryStore::new());
    let backend = MockBackend::new(common::faces());
    let system = start(&backend, &store);

    let removed = system.remove_font_file(Path::new("/fonts/arialbd.ttf"), FaceFlags::ADD_TO_CACHE);
    assert_eq!(removed, 1);
    assert_eq!(style_names(&store, "Fonts/Cache/Arial"), ["Regular"]);

    // both the face and its vertical variant
    let removed = system.remove_font_file(Path::new("/fonts/msgothic.ttc"), FaceFlags::ADD_TO_CACHE);
    assert_eq!(removed, 2);
    assert!(style_names(&store, "Fonts/Cache/MS Gothic").is_empty());
    assert!(style_names(&store, "Fonts/Cache/@MS Gothic").is_empty());

    // a flag mismatch removes nothing
    let removed = system.remove_font_file(Path::new("/fonts/arial.ttf"), FaceFlags::EXTERNAL);
    assert_eq!(removed, 0);

    system.clear_discovery_cache();
    assert!(!store.has_key("Fonts/Cache/Arial"));
    drop(system);

    let backend = MockBackend::new(common::faces());
    let _ = start(&backend, &store);
    assert_eq!(backend.discovers(), 1);
}

#[test]
fn faces_in_use_outlive_removal() {
    let (system, _) = system();
    let mut bold = LogFont::new("Arial", -20, Charset::ANSI);
    bold.weight = FontWeight::BOLD;
    let handle = system.resolve_or_create(&bold, &Matrix::IDENTITY, false).unwrap();

    let removed = system.remove_font_file(Path::new("/fonts/arialbd.ttf"), FaceFlags::ADD_TO_CACHE);
    assert_eq!(removed, 1);
    assert_eq!(system.font_info(handle).unwrap().full_name, "Arial Bold");
    assert_eq!(system.glyph_index(handle, 'a').unwrap().glyph.0, 1);
    let find = || system.with_registry(|reg| reg.find_face_by_full_name("Arial Bold").is_some());
    assert!(find());

    // the face is freed with the last font using it
    system.release(handle).unwrap();
    for height in 10..10 + UNUSED_CACHE_SIZE as i32 {
        let lf = LogFont::new("Times New Roman", -height, Charset::ANSI);
        let other = system.resolve_or_create(&lf, &Matrix::IDENTITY, false).unwrap();
        system.release(other).unwrap();
    }
    assert!(system.font_info(handle).is_err());
    assert!(!find());
}

#[test]
fn application_faces_are_scoped() {
    let (system, _) = system();
    let mut desc = common::faces()[2].desc.clone();
    desc.family_name = "Private".to_string();
    desc.full_name = "Private".to_string();
    assert_eq!(system.add_faces(&[desc], FaceFlags::EXTERNAL), 1);

    let lf = LogFont::new("Private", -12, Charset::ANSI);
    let handle = system.resolve_or_create(&lf, &Matrix::IDENTITY, false).unwrap();
    assert_eq!(system.font_info(handle).unwrap().name, "Private");
    system.release(handle).unwrap();

    // only the application's face shares this scope
    let removed = system.remove_font_file(Path::new("/fonts/times.ttf"), FaceFlags::EXTERNAL);
    assert_eq!(removed, 1);
    system.with_registry(|reg| {
        assert!(reg.find_family("Times New Roman").is_some());
    });
}
