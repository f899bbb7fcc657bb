mod common;

use admin_burn::{
    as_buffer, as_module, as_parameter, calculate_init, AdminError, OutputChangeScale, ParamStore,
};
use burn_ndarray::NdArrayDevice;
use common::{values, TestBackend};

#[test]
fn buffer_matches_fixed_module() {
    let device = NdArrayDevice::default();
    for scale in OutputChangeScale::ALL {
        let mut network = ParamStore::<TestBackend>::new();
        as_buffer(&mut network, "attn_omega", 12, scale, &device).expect("attach buffer");

        assert_eq!(network.len(), 1);
        assert_eq!(network.names(), vec!["attn_omega"]);
        assert!(network.parameter("attn_omega").is_none());

        let module = as_module::<TestBackend>(12, scale, false, None, &device).expect("module");
        let buffer = network.buffer("attn_omega").expect("buffer registered");
        assert_eq!(values(buffer), values(module.omega()));
    }
}

#[test]
fn parameter_matches_trainable_module() {
    let device = NdArrayDevice::default();
    let mut network = ParamStore::<TestBackend>::new();
    as_parameter(&mut network, "ffn_omega", 12, 16, OutputChangeScale::Logarithmic, &device)
        .expect("attach parameter");

    assert_eq!(network.len(), 1);
    assert!(network.buffer("ffn_omega").is_none());

    let module = as_module::<TestBackend>(12, OutputChangeScale::Logarithmic, true, Some(16), &device)
        .expect("module");
    let parameter = network.parameter("ffn_omega").expect("parameter registered");
    let registered = values(parameter.val());
    assert_eq!(registered.len(), 16);
    assert_eq!(registered, values(module.omega()));

    let expected = calculate_init(12, OutputChangeScale::Logarithmic).unwrap() as f32;
    assert!(registered.iter().all(|v| *v == expected));
}

#[test]
fn attachments_leave_existing_values_untouched() {
    let device = NdArrayDevice::default();
    let mut network = ParamStore::<TestBackend>::new();
    as_buffer(&mut network, "attn_omega", 4, OutputChangeScale::Constant, &device).unwrap();
    as_parameter(&mut network, "ffn_omega", 4, 3, OutputChangeScale::Linear, &device).unwrap();

    assert_eq!(network.names(), vec!["attn_omega", "ffn_omega"]);
    assert_eq!(values(network.buffer("attn_omega").unwrap()), vec![2.0]);
    assert_eq!(values(network.get("ffn_omega").unwrap()), vec![1.0, 1.0, 1.0]);
}

#[test]
fn failed_attachments_register_nothing() {
    let device = NdArrayDevice::default();
    let mut network = ParamStore::<TestBackend>::new();

    let err = as_buffer(&mut network, "omega", 0, OutputChangeScale::Logarithmic, &device).unwrap_err();
    assert!(matches!(err, AdminError::InvalidArgument(_)));
    assert!(as_buffer(&mut network, "", 6, OutputChangeScale::Logarithmic, &device).is_err());
    assert!(as_parameter(&mut network, "a.b", 6, 4, OutputChangeScale::Logarithmic, &device).is_err());
    assert!(network.is_empty());

    as_buffer(&mut network, "omega", 6, OutputChangeScale::Logarithmic, &device).unwrap();
    let err = as_parameter(&mut network, "omega", 6, 4, OutputChangeScale::Logarithmic, &device)
        .unwrap_err();
    assert!(err.to_string().contains("already exists"));
    assert_eq!(network.len(), 1);
    assert!(network.parameter("omega").is_none());
}
