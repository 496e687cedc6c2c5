use std::collections::BTreeMap;
use std::fs;
use vvdb_core::size_map::{self, PathFilter};
use vvdb_core::walk::slash_path;

#[test]
fn exported_module_lists_every_file_under_existing_dirs() {
    let td = tempfile::tempdir().unwrap();
    let a = td.path().join("Matis_drc0");
    let b = td.path().join("Matis_jp00");
    let gone = td.path().join("Matis_drc5");
    fs::create_dir_all(a.join("sub")).unwrap();
    fs::create_dir_all(&b).unwrap();
    fs::write(a.join("m_00001.drc"), vec![0u8; 11]).unwrap();
    fs::write(a.join("sub/m_00002.drc"), vec![0u8; 0]).unwrap();
    fs::write(b.join("m_00001_jp00.jpg"), vec![0u8; 4096]).unwrap();

    let map = size_map::collect(&[a.clone(), gone.clone(), b.clone()], &PathFilter::all()).unwrap();
    assert_eq!(map.missing, vec![gone]);

    let out = td.path().join("mapping.js");
    size_map::write_file(&map, &out).unwrap();
    let parsed = size_map::parse_js(&fs::read_to_string(&out).unwrap()).unwrap();

    let expected: BTreeMap<String, u64> = [
        (slash_path(&a.join("m_00001.drc")), 11),
        (slash_path(&a.join("sub/m_00002.drc")), 0),
        (slash_path(&b.join("m_00001_jp00.jpg")), 4096),
    ]
    .into_iter()
    .collect();
    assert_eq!(parsed, expected);
}

#[test]
fn json_output_carries_the_same_mapping() {
    let td = tempfile::tempdir().unwrap();
    let d = td.path().join("d");
    fs::create_dir_all(&d).unwrap();
    fs::write(d.join("x.drc"), b"abc").unwrap();
    fs::write(d.join("y.jpg"), b"abcdef").unwrap();

    let filter = PathFilter::new(&["**/*.drc".to_string()], &[]).unwrap();
    let map = size_map::collect(&[d.clone()], &filter).unwrap();
    let out = td.path().join("out/mapping.json");
    size_map::write_file(&map, &out).unwrap();

    let parsed: BTreeMap<String, u64> = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[&slash_path(&d.join("x.drc"))], 3);
}

#[test]
fn all_missing_still_writes_an_empty_module() {
    let td = tempfile::tempdir().unwrap();
    let map = size_map::collect(&[td.path().join("nope")], &PathFilter::all()).unwrap();
    assert!(map.entries.is_empty());
    let mut buf = Vec::new();
    size_map::write_js(&map, &mut buf).unwrap();
    assert_eq!(
        String::from_utf8(buf).unwrap(),
        "const fileSizesByFilePath = {\n};\nmodule.exports = { fileSizesByFilePath };\n"
    );
}

#[cfg(unix)]
#[test]
fn symlinked_files_are_recorded_with_target_size() {
    let td = tempfile::tempdir().unwrap();
    let d = td.path().join("Matis_drc0");
    fs::create_dir_all(&d).unwrap();
    let target = td.path().join("real.drc");
    fs::write(&target, vec![0u8; 10]).unwrap();
    std::os::unix::fs::symlink(&target, d.join("Matis_00001_qp08_qt06_cl10.drc")).unwrap();

    let map = size_map::collect(&[d.clone()], &PathFilter::all()).unwrap();
    assert_eq!(
        map.entries.get(&slash_path(&d.join("Matis_00001_qp08_qt06_cl10.drc"))),
        Some(&10)
    );
}

#[cfg(unix)]
#[test]
fn unreadable_subdirectory_does_not_abort_the_export() {
    use std::os::unix::fs::PermissionsExt;

    let td = tempfile::tempdir().unwrap();
    let d = td.path().join("Matis_jp00");
    let locked = d.join("locked");
    fs::create_dir_all(&locked).unwrap();
    fs::write(d.join("ok.jpg"), vec![0u8; 5]).unwrap();
    fs::write(locked.join("hidden.jpg"), vec![0u8; 6]).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    // privileged users read through mode 000
    let privileged = fs::read_dir(&locked).is_ok();

    let map = size_map::collect(&[d.clone()], &PathFilter::all());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    let map = map.unwrap();

    assert_eq!(map.entries.get(&slash_path(&d.join("ok.jpg"))), Some(&5));
    if !privileged {
        assert!(!map.entries.contains_key(&slash_path(&locked.join("hidden.jpg"))));
        assert_eq!(map.unreadable, vec![locked]);
    }
}
