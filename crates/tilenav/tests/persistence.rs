use std::io::Cursor;

use tilenav::{
    FixtureId, FixtureKind, FixturePalette, NavmeshConfig, RectilinearClipper, TileFlags, TileMap,
    TileMapReadError, build_navmesh,
};

fn furnished_map() -> (TileMap, FixturePalette) {
    let mut map = TileMap::new(5, 3, 16);
    for row in 0..3 {
        for col in 0..5 {
            map.set(row, col, TileFlags::FLOOR);
        }
    }
    map.set(0, 1, TileFlags::WALL_EAST | TileFlags::CORNER_INNER_NE);
    map.set(1, 1, TileFlags::DOOR_EAST);
    map.set(2, 1, TileFlags::WALL_EAST | TileFlags::TERMINUS_SOUTH);
    let table = FixtureId::new(12).unwrap();
    map.set_fixture(1, 3, Some(table));

    let mut palette = FixturePalette::new();
    palette.insert(
        table,
        FixtureKind {
            width: 1,
            height: 2,
        },
    );
    (map, palette)
}

#[test]
fn reloaded_map_builds_the_same_navmesh() {
    let (map, palette) = furnished_map();
    let mut file = Cursor::new(Vec::new());
    map.write_to(&mut file).unwrap();
    file.set_position(0);

    let reloaded = TileMap::read_from(&mut file).unwrap();
    assert_eq!(reloaded, map);
    assert_eq!(reloaded.fixture(1, 3), FixtureId::new(12));

    let config = NavmeshConfig::default();
    let original = build_navmesh(&map, &palette, &config, &RectilinearClipper).unwrap();
    let rebuilt = build_navmesh(&reloaded, &palette, &config, &RectilinearClipper).unwrap();
    assert_eq!(original, rebuilt);
    assert_eq!(rebuilt.obstacles.doors.len(), 1);
    assert_eq!(rebuilt.obstacles.walls.len(), 2);
}

#[test]
fn header_only_input_is_truncated() {
    let map = TileMap::new(2, 2, 8);
    let bytes = map.to_bytes();
    // Three one-byte header varints followed by four cells.
    assert_eq!(bytes.len(), 7);
    let err = TileMap::read_from(&bytes[..3]).unwrap_err();
    assert!(matches!(err, TileMapReadError::Truncated));
}
