// Integration tests for the engine boundary adapter, against the in-process fake engine

mod common;

use weld_marshal::engine::{
    load_library, set_log_level, LogLevel, WeldConf, WeldError, WeldModule, WeldValue,
};
use weld_marshal::types::parse::parse_struct;
use weld_marshal::{Managed, MarshalError, Value, VecBuilder, WeldStruct};

#[test_log::test]
fn test_compile_error_surfaces_code_and_message() {
    let (engine, fake) = common::engine();

    match WeldModule::compile(&engine, "foo") {
        Err(err) => {
            assert_eq!(err.code(), Some(3));
            assert_eq!(
                err,
                MarshalError::Engine {
                    code: 3,
                    message: "Undefined symbol foo in uniquify".to_string(),
                }
            );
            assert_eq!(err.to_string(), "Undefined symbol foo in uniquify (code 3)");
        }
        Ok(_) => panic!("compiling an unknown program should fail"),
    }
    // The module handle returned with the error, the error and the default conf are all released
    assert_eq!(fake.live_modules(), 0);
    assert_eq!(fake.live_handles(), 0);
}

#[test]
fn test_compile_and_run() {
    let (engine, fake) = common::engine();
    let mut module = WeldModule::compile(&engine, "sum").expect("compiles");
    assert!(!module.handle().is_null());

    let input = WeldStruct::build(&[VecBuilder::i64s(vec![1, 2, 3, 4]).into()])
        .expect("build failed");
    let mut arg = WeldValue::from_struct(&engine, &input);
    assert_eq!(arg.data(), input.address());
    assert_eq!(arg.run_id(), -1);

    let mut output = module.run(&arg).expect("run succeeds");
    assert!(output.run_id() > 0);
    let ty = parse_struct("{i64}").expect("valid type");
    assert_eq!(unsafe { output.view(&ty) }.get_i64(0), 10);

    assert_eq!(fake.live_values(), 2);
    assert_eq!(fake.live_errors(), 0);
    assert_eq!(fake.live_confs(), 0);

    output.close();
    arg.close();
    module.close();
    assert_eq!(fake.live_handles(), 0);
}

#[test]
fn test_run_decodes_nested_output() {
    let (engine, _fake) = common::engine();
    let module = WeldModule::compile(&engine, "stats").expect("compiles");
    let input = WeldStruct::build(&[VecBuilder::f64s(vec![0.5, 1.5, 2.0]).into()])
        .expect("build failed");
    let arg = WeldValue::from_struct(&engine, &input);

    let output = module.run(&arg).expect("run succeeds");
    let view = unsafe { output.view_as("{i64, f64, vec[f64]}") }.expect("valid type");
    assert_eq!(view.get_i64(0), 3);
    assert_eq!(view.get_f64(1), 4.0);
    assert_eq!(view.get_vec(2).to_f64_vec(), vec![0.5, 2.0, 4.0]);
}

#[test]
fn test_run_ids_increase() {
    let (engine, _fake) = common::engine();
    let module = WeldModule::compile(&engine, "sum").expect("compiles");
    let input = WeldStruct::build(&[VecBuilder::i64s(Vec::<i64>::new()).into()]).expect("build failed");
    let arg = WeldValue::from_struct(&engine, &input);

    let first = module.run(&arg).expect("run succeeds");
    let second = module.run(&arg).expect("run succeeds");
    assert!(second.run_id() > first.run_id());
    assert_eq!(unsafe { second.view_as("{i64}") }.expect("valid type").get_i64(0), 0);
}

#[test_log::test]
fn test_run_failure_releases_output() {
    let (engine, fake) = common::engine();
    let module = WeldModule::compile(&engine, "fail").expect("compiles");
    let input = WeldStruct::build(&[Value::I32(0)]).expect("build failed");
    let arg = WeldValue::from_struct(&engine, &input);

    let err = module.run(&arg).err().expect("run fails");
    assert_eq!(err.code(), Some(5));
    assert!(err.to_string().contains("failed at runtime"));

    // Only the input value is left
    assert_eq!(fake.live_values(), 1);
    assert_eq!(fake.live_errors(), 0);
    assert_eq!(fake.live_confs(), 0);
}

#[test]
fn test_run_with_conf() {
    let (engine, fake) = common::engine();
    let conf = WeldConf::from_pairs(&engine, [("weld.threads", "4"), ("weld.memory.limit", "1024")])
        .expect("valid pairs");
    let module = WeldModule::compile_with(&engine, &conf, "sum").expect("compiles");
    let input = WeldStruct::build(&[VecBuilder::i64s(vec![7]).into()]).expect("build failed");
    let arg = WeldValue::from_struct(&engine, &input);

    let output = module.run_with(&conf, &arg).expect("run succeeds");
    assert_eq!(unsafe { output.view_as("{i64}") }.expect("valid type").get_i64(0), 7);
    // The caller's conf stays open
    assert_eq!(fake.live_confs(), 1);
    assert!(!conf.is_closed());
}

#[test]
fn test_conf_get_and_set() {
    let (engine, _fake) = common::engine();
    let conf = WeldConf::new(&engine);

    assert_eq!(conf.get("weld.threads").expect("valid key"), None);
    conf.set("weld.threads", "2").expect("valid pair");
    conf.set("weld.threads", "3").expect("valid pair");
    assert_eq!(conf.get("weld.threads").expect("valid key"), Some("3".to_string()));

    assert!(matches!(
        conf.set("bad\0key", "1"),
        Err(MarshalError::InvalidString { .. })
    ));
    assert!(matches!(
        conf.get("bad\0key"),
        Err(MarshalError::InvalidString { .. })
    ));
}

#[test]
fn test_interior_nul_in_code() {
    let (engine, fake) = common::engine();
    assert!(matches!(
        WeldModule::compile(&engine, "su\0m"),
        Err(MarshalError::InvalidString { .. })
    ));
    assert_eq!(fake.live_handles(), 0);
}

#[test]
fn test_fresh_error_is_success() {
    let (engine, _fake) = common::engine();
    let err = WeldError::new(&engine);

    assert_eq!(err.code(), 0);
    assert!(err.is_success());
    assert_eq!(err.check(), Ok(()));
}

#[test]
fn test_load_library() {
    let (engine, fake) = common::engine();

    load_library(&engine, "libudf.so").expect("loads");
    assert_eq!(fake.libraries(), vec!["libudf.so".to_string()]);

    let err = load_library(&engine, "libudf.dll").err().expect("fails");
    assert_eq!(err.code(), Some(1));
    assert_eq!(fake.live_errors(), 0);
}

#[test]
fn test_set_log_level() {
    let (engine, fake) = common::engine();

    set_log_level(&engine, "DEBUG").expect("known level");
    assert_eq!(fake.log_level(), Some(LogLevel::Debug));
    set_log_level(&engine, "off").expect("known level");
    assert_eq!(fake.log_level(), Some(LogLevel::Off));

    assert_eq!(
        set_log_level(&engine, "loud"),
        Err(MarshalError::InvalidLogLevel {
            level: "loud".to_string()
        })
    );
    assert_eq!(fake.log_level(), Some(LogLevel::Off));
}

#[test]
fn test_log_level_names() {
    for level in [
        LogLevel::Off,
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ] {
        assert_eq!(level.to_string().parse::<LogLevel>(), Ok(level));
    }
    assert_eq!(LogLevel::from(tracing::Level::WARN), LogLevel::Warn);
    assert_eq!(LogLevel::from(tracing::Level::TRACE), LogLevel::Trace);
}

#[test]
fn test_value_from_address() {
    let (engine, fake) = common::engine();
    let input = WeldStruct::build(&[Value::I32(9)]).expect("build failed");

    let value = unsafe { WeldValue::from_address(&engine, input.address()) };
    assert_eq!(value.data(), input.address());
    assert!(matches!(
        unsafe { value.view_as("vec[i32]") },
        Err(MarshalError::InvalidType { .. })
    ));
    drop(value);
    assert_eq!(fake.live_values(), 0);
}

#[test]
#[should_panic(expected = "Cannot access an already closed object")]
fn test_run_after_module_close() {
    let (engine, _fake) = common::engine();
    let mut module = WeldModule::compile(&engine, "sum").expect("compiles");
    let input = WeldStruct::build(&[VecBuilder::i64s(vec![1]).into()]).expect("build failed");
    let arg = WeldValue::from_struct(&engine, &input);

    module.close();
    let _ = module.run(&arg);
}
