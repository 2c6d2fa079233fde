//! Integration test for palette construction under concurrent sampling.

use std::thread;

use strata_region::{
    Catalogs, CellView, CodecConfig, PropertyMap, Registry, RegionBuilder, SharedPalettes,
    VoxelCatalog, VoxelColumn, VoxelType,
};

fn registry(types: usize) -> Registry {
    let mut registry = Registry::new().with_biome("minecraft:plains", 1);
    for t in 0..types {
        registry.insert_voxel(VoxelType::bare(format!("test:voxel_{t}")).with_property("shade", "0"));
    }
    registry
}

fn shade(value: usize) -> PropertyMap {
    [("shade".to_string(), value.to_string())].into_iter().collect()
}

#[test]
fn test_shared_palettes_never_duplicate() {
    let registry = registry(16);
    let palettes = SharedPalettes::new();
    let num_threads = 8;

    thread::scope(|s| {
        for t in 0..num_threads {
            let palettes = &palettes;
            let registry = &registry;
            s.spawn(move || {
                // Every thread walks the same values in a different order.
                for i in 0..16 * 4 {
                    let n = (i + t * 7) % (16 * 4);
                    let voxel = registry.voxel_type(&format!("test:voxel_{}", n % 16)).unwrap();
                    palettes.cell(voxel, &shade(n / 16)).unwrap();
                    palettes.biome("minecraft:plains").unwrap();
                }
            });
        }
    });

    let (materials, biomes) = palettes.into_inner();
    assert_eq!(materials.len(), 16);
    assert_eq!(biomes.len(), 1);
    for (position, entry) in materials.iter().enumerate() {
        assert_eq!(entry.index as usize, position);
        assert_eq!(entry.states.len(), 4);
    }
}

#[test]
fn test_parallel_chunks_share_indices() {
    let registry = registry(2);
    let config = CodecConfig::default();
    let builder = RegionBuilder::new(4, 4, Catalogs::from_registry(&registry), &config);

    let columns: Vec<VoxelColumn> = (0..16)
        .map(|index| {
            let mut column = VoxelColumn::new(2);
            let section = column.section_mut(index % 2);
            section.set_cell(0, 0, 0, CellView::plain(format!("test:voxel_{}", index % 2)));
            section.set_cell(1, 0, 0, CellView::new("test:voxel_0", shade(index % 3)));
            section.fill_biome(1);
            column
        })
        .collect();

    thread::scope(|s| {
        for (index, column) in columns.iter().enumerate() {
            let builder = &builder;
            s.spawn(move || builder.add_chunk(index, column).unwrap());
        }
    });

    let region = builder.finish().unwrap();
    assert_eq!(region.chunk_count(), 16);
    assert_eq!(region.populated().count(), 16);
    assert_eq!(region.materials().len(), 2);
    assert_eq!(region.biomes().len(), 1);

    let voxel_0 = region
        .materials()
        .iter()
        .find(|e| e.identifier == "test:voxel_0")
        .unwrap();
    assert_eq!(voxel_0.states.len(), 3);

    for (index, chunk) in region.chunks() {
        let section = chunk.section(index % 2).unwrap();
        let cell = section.cell(0, 0, 0).unwrap();
        let (entry, _) = region.materials().resolve(cell.material, cell.state).unwrap();
        assert_eq!(entry.identifier, format!("test:voxel_{}", index % 2));
    }
}
