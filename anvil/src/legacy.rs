//! A best-effort pre-flattening (pre-1.13) numeric block id table.
//!
//! Follows `fastanvil::java::pre13`'s `(RawBlock, BLOCK_LIST)` pattern: a
//! flat `id -> name` table with a handful of `(id, data)` pairs for blocks
//! whose legacy metadata changed the block identity rather than just its
//! rendering. This is not an exhaustive reimplementation of every legacy id,
//! only the common overworld set a save converter is likely to actually
//! encounter.

/// Look up a legacy `(id, data)` pair. Falls back to the id-only entry when
/// no id+data pair is registered, and to `minecraft:unknown` when the id
/// itself is unrecognised.
pub fn resolve(id: u8, data: u8) -> &'static str {
    for &(table_id, table_data, name) in LEGACY_ID_DATA {
        if table_id == id && table_data == data {
            return name;
        }
    }
    for &(table_id, name) in LEGACY_ID {
        if table_id == id {
            return name;
        }
    }
    "minecraft:unknown"
}

/// Blocks whose legacy `data` nibble selected a genuinely different block
/// (colored wool/wood variants and the like).
const LEGACY_ID_DATA: &[(u8, u8, &str)] = &[
    (35, 0, "minecraft:white_wool"),
    (35, 1, "minecraft:orange_wool"),
    (35, 2, "minecraft:magenta_wool"),
    (35, 3, "minecraft:light_blue_wool"),
    (35, 4, "minecraft:yellow_wool"),
    (35, 5, "minecraft:lime_wool"),
    (35, 6, "minecraft:pink_wool"),
    (35, 7, "minecraft:gray_wool"),
    (35, 8, "minecraft:light_gray_wool"),
    (35, 9, "minecraft:cyan_wool"),
    (35, 10, "minecraft:purple_wool"),
    (35, 11, "minecraft:blue_wool"),
    (35, 12, "minecraft:brown_wool"),
    (35, 13, "minecraft:green_wool"),
    (35, 14, "minecraft:red_wool"),
    (35, 15, "minecraft:black_wool"),
    (17, 0, "minecraft:oak_log"),
    (17, 1, "minecraft:spruce_log"),
    (17, 2, "minecraft:birch_log"),
    (17, 3, "minecraft:jungle_log"),
    (5, 0, "minecraft:oak_planks"),
    (5, 1, "minecraft:spruce_planks"),
    (5, 2, "minecraft:birch_planks"),
    (5, 3, "minecraft:jungle_planks"),
    (5, 4, "minecraft:acacia_planks"),
    (5, 5, "minecraft:dark_oak_planks"),
];

/// Base id-only legacy table.
const LEGACY_ID: &[(u8, &str)] = &[
    (0, "minecraft:air"),
    (1, "minecraft:stone"),
    (2, "minecraft:grass_block"),
    (3, "minecraft:dirt"),
    (4, "minecraft:cobblestone"),
    (5, "minecraft:oak_planks"),
    (7, "minecraft:bedrock"),
    (8, "minecraft:water"),
    (9, "minecraft:water"),
    (10, "minecraft:lava"),
    (11, "minecraft:lava"),
    (12, "minecraft:sand"),
    (13, "minecraft:gravel"),
    (14, "minecraft:gold_ore"),
    (15, "minecraft:iron_ore"),
    (16, "minecraft:coal_ore"),
    (17, "minecraft:oak_log"),
    (18, "minecraft:oak_leaves"),
    (19, "minecraft:sponge"),
    (20, "minecraft:glass"),
    (21, "minecraft:lapis_ore"),
    (22, "minecraft:lapis_block"),
    (24, "minecraft:sandstone"),
    (35, "minecraft:white_wool"),
    (41, "minecraft:gold_block"),
    (42, "minecraft:iron_block"),
    (44, "minecraft:smooth_stone_slab"),
    (45, "minecraft:bricks"),
    (46, "minecraft:tnt"),
    (47, "minecraft:bookshelf"),
    (48, "minecraft:mossy_cobblestone"),
    (49, "minecraft:obsidian"),
    (50, "minecraft:torch"),
    (53, "minecraft:oak_stairs"),
    (54, "minecraft:chest"),
    (56, "minecraft:diamond_ore"),
    (57, "minecraft:diamond_block"),
    (58, "minecraft:crafting_table"),
    (61, "minecraft:furnace"),
    (64, "minecraft:oak_door"),
    (65, "minecraft:ladder"),
    (66, "minecraft:rail"),
    (73, "minecraft:redstone_ore"),
    (78, "minecraft:snow"),
    (79, "minecraft:ice"),
    (80, "minecraft:snow_block"),
    (82, "minecraft:clay"),
    (85, "minecraft:oak_fence"),
    (86, "minecraft:pumpkin"),
    (87, "minecraft:netherrack"),
    (88, "minecraft:soul_sand"),
    (89, "minecraft:glowstone"),
    (91, "minecraft:jack_o_lantern"),
    (98, "minecraft:stone_bricks"),
    (102, "minecraft:glass_pane"),
    (103, "minecraft:melon"),
    (112, "minecraft:nether_bricks"),
    (121, "minecraft:end_stone"),
    (129, "minecraft:emerald_ore"),
    (133, "minecraft:emerald_block"),
    (137, "minecraft:command_block"),
    (152, "minecraft:redstone_block"),
    (155, "minecraft:quartz_block"),
    (159, "minecraft:terracotta"),
    (162, "minecraft:acacia_log"),
    (169, "minecraft:sea_lantern"),
    (172, "minecraft:terracotta"),
    (173, "minecraft:coal_block"),
    (174, "minecraft:packed_ice"),
];
