use std::fs;
use std::path::{Path, PathBuf};
use vvdb_core::pair_size::{self, MissingCounterpart};
use vvdb_core::pairing::PairingTable;
use vvdb_core::DatasetError;

/// Write `Matis_<level>/Matis_<n>_<q>.drc` with `mesh` bytes and the matching
/// `Matis_<jp>/Matis_<n>_<jp>.jpg` with `image` bytes.
fn write_pair(root: &Path, level: &str, frame: usize, mesh: usize, image: Option<usize>) -> PathBuf {
    let (jp, q) = match level {
        "drc0" => ("jp00", "qp08_qt06_cl10"),
        "drc1" => ("jp10", "qp10_qt10_cl10"),
        "drc3" => ("jp30", "qp12_qt10_cl10"),
        "drc4" => ("jp55", "qp12_qt12_cl10"),
        _ => unreachable!(),
    };
    let mdir = root.join(format!("Matis_{level}"));
    let idir = root.join(format!("Matis_{jp}"));
    fs::create_dir_all(&mdir).unwrap();
    fs::create_dir_all(&idir).unwrap();
    let mesh_path = mdir.join(format!("Matis_{frame:05}_{q}.drc"));
    fs::write(&mesh_path, vec![1u8; mesh]).unwrap();
    if let Some(n) = image {
        fs::write(idir.join(format!("Matis_{frame:05}_{jp}.jpg")), vec![2u8; n]).unwrap();
    }
    mesh_path
}

#[test]
fn average_is_exact_over_all_levels() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path();
    write_pair(root, "drc0", 1, 10, Some(5));
    write_pair(root, "drc1", 1, 20, Some(7));
    write_pair(root, "drc3", 2, 3, Some(4));
    write_pair(root, "drc4", 3, 100, Some(1));
    // unrelated file is ignored
    fs::write(root.join("README.txt"), b"notes").unwrap();

    let table = PairingTable::dataset();
    let scan = pair_size::scan(root, &table, MissingCounterpart::Fatal).unwrap();
    assert_eq!(scan.pairs_seen, 4);
    assert_eq!(scan.total_bytes, 15 + 27 + 7 + 101);
    let avg = pair_size::average(root, &table, MissingCounterpart::Fatal).unwrap();
    assert_eq!(avg, 150.0 / 4.0);
}

#[test]
fn max_and_min_pick_extremes_with_first_seen_ties() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path();
    let a = write_pair(root, "drc0", 1, 10, Some(10));
    write_pair(root, "drc0", 2, 15, Some(5));
    let small = write_pair(root, "drc0", 3, 1, Some(2));
    write_pair(root, "drc0", 4, 2, Some(1));

    let table = PairingTable::dataset();
    let max = pair_size::max(root, &table, MissingCounterpart::Fatal).unwrap().unwrap();
    assert_eq!(max.mesh.path, a);
    assert_eq!(max.combined(), 20);
    assert!(max.image.path.ends_with("Matis_jp00/Matis_00001_jp00.jpg"));

    let min = pair_size::min(root, &table, MissingCounterpart::Fatal).unwrap().unwrap();
    assert_eq!(min.mesh.path, small);
    assert_eq!(min.combined(), 3);
}

#[test]
fn empty_or_absent_directory_has_no_pairs() {
    let td = tempfile::tempdir().unwrap();
    let table = PairingTable::dataset();
    let absent = td.path().join("absent");

    assert!(pair_size::max(td.path(), &table, MissingCounterpart::Fatal).unwrap().is_none());
    assert!(pair_size::min(&absent, &table, MissingCounterpart::Fatal).unwrap().is_none());

    let err = pair_size::average(&absent, &table, MissingCounterpart::Fatal).unwrap_err();
    assert!(matches!(err.downcast_ref::<DatasetError>(), Some(DatasetError::NoPairs(_))));
}

#[test]
fn missing_counterpart_follows_policy() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path();
    write_pair(root, "drc0", 1, 10, Some(6));
    let orphan = write_pair(root, "drc0", 2, 40, None);
    let table = PairingTable::dataset();

    let err = pair_size::scan(root, &table, MissingCounterpart::Fatal).unwrap_err();
    match err.downcast_ref::<DatasetError>() {
        Some(DatasetError::MissingCounterpart { mesh, .. }) => assert_eq!(mesh, &orphan),
        other => panic!("unexpected: {other:?}"),
    }

    let skip = pair_size::scan(root, &table, MissingCounterpart::Skip).unwrap();
    assert_eq!(skip.pairs_seen, 1);
    assert_eq!(skip.skipped_missing, 1);
    assert_eq!(skip.average(), Some(16.0));

    let zero = pair_size::scan(root, &table, MissingCounterpart::Zero).unwrap();
    assert_eq!(zero.pairs_seen, 2);
    assert_eq!(zero.largest.as_ref().unwrap().combined(), 40);
    assert_eq!(zero.average(), Some(28.0));
}

#[cfg(unix)]
#[test]
fn symlinked_mesh_is_paired() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path().join("Matis_obj_Draco-Jpeg");
    fs::create_dir_all(root.join("Matis_drc0")).unwrap();
    fs::create_dir_all(root.join("Matis_jp00")).unwrap();
    let real = td.path().join("mesh.bin");
    fs::write(&real, vec![1u8; 10]).unwrap();
    let link = root.join("Matis_drc0/Matis_00001_qp08_qt06_cl10.drc");
    std::os::unix::fs::symlink(&real, &link).unwrap();
    fs::write(root.join("Matis_jp00/Matis_00001_jp00.jpg"), vec![2u8; 4]).unwrap();

    let max = pair_size::max(&root, &PairingTable::dataset(), MissingCounterpart::Fatal)
        .unwrap()
        .unwrap();
    assert_eq!(max.mesh.path, link);
    assert_eq!(max.combined(), 14);
}
