use verseview::{
    MaterialSpec,
    compositor::compose,
    data_structures::material::{FALLBACK_COLOR, MaterialUniform, WIREFRAME_COLOR},
};

#[test]
fn preset_table_is_exact() {
    let matte = MaterialSpec::Matte.params();
    assert_eq!((matte.metalness, matte.roughness), (0.1, 0.8));
    assert!(!matte.wireframe);

    let metallic = MaterialSpec::Metallic.params();
    assert_eq!((metallic.metalness, metallic.roughness), (0.9, 0.1));

    let cotton = MaterialSpec::Cotton.params();
    assert_eq!((cotton.metalness, cotton.roughness), (0.0, 0.8));

    let silk = MaterialSpec::Silk.params();
    assert_eq!(
        (silk.metalness, silk.roughness, silk.clearcoat),
        (0.1, 0.1, 0.9)
    );

    let denim = MaterialSpec::Denim.params();
    assert_eq!((denim.metalness, denim.roughness), (0.2, 0.7));

    assert!(MaterialSpec::Wireframe.params().wireframe);
}

#[test]
fn default_preset_is_matte() {
    assert_eq!(MaterialSpec::default(), MaterialSpec::Matte);
}

#[test]
fn fallback_colors_match_the_visual_contract() {
    assert_eq!(FALLBACK_COLOR, [0x9B, 0x5D, 0xE5, 0xFF]);
    assert_eq!(WIREFRAME_COLOR, [0x00, 0xF5, 0xD4, 0xFF]);
    for spec in [
        MaterialSpec::Matte,
        MaterialSpec::Metallic,
        MaterialSpec::Cotton,
        MaterialSpec::Silk,
        MaterialSpec::Denim,
    ] {
        assert_eq!(spec.fallback_color(), FALLBACK_COLOR);
    }
    assert_eq!(MaterialSpec::Wireframe.fallback_color(), WIREFRAME_COLOR);
}

#[test]
fn uniform_carries_the_preset_parameters() {
    let params = MaterialSpec::Silk.params();
    let uniform = MaterialUniform::new(&params);
    assert_eq!(uniform.metalness, 0.1);
    assert_eq!(uniform.roughness, 0.1);
    assert_eq!(uniform.clearcoat, 0.9);
    assert_eq!(uniform.unlit, 0.0);
    // the flat color lives in the 1x1 map, not the uniform
    assert_eq!(uniform.base_color, [1.0, 1.0, 1.0, 1.0]);

    let unlit = MaterialUniform::new(&MaterialSpec::Wireframe.params());
    assert_eq!(unlit.unlit, 1.0);
}

#[test]
fn wireframe_composition_discards_texture_input() {
    let image = image::DynamicImage::new_rgba8(4, 4);
    assert!(!compose(MaterialSpec::Wireframe, Some(image.clone())).is_textured());
    assert!(compose(MaterialSpec::Denim, Some(image)).is_textured());
}

#[test]
fn preset_names_are_stable() {
    assert_eq!(MaterialSpec::Matte.to_string(), "matte");
    assert_eq!(MaterialSpec::Wireframe.to_string(), "wireframe");
    assert_eq!(MaterialSpec::Denim.to_string(), "denim");
}
