//! Aggregation example
//!
//! Builds a `Car` object that answers `XCar` itself and `XEngine` through an
//! aggregated `Engine`, then walks the interfaces and reference counts.
//!
//! # Environment Variables
//!
//! - `RUST_LOG=gem=debug` - Log object creation and destruction
//! - `RUST_LOG=gem::refcount=trace GEM_TRACE_REFCOUNT=1` - Log every count change
//! - `GEM_CATCH_INIT_PANICS=0` - Let a panicking `initialize` unwind

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use gem::{
    gem_interface, interface_map, result_to_string, Aggregate, GemPtr, GemResult, Generic,
    GenericBase, Inner, OuterRef, ResultCode, XGeneric,
};

gem_interface! {
    /// Vehicle controls
    pub trait XCar: iid(0x4341_5200_0000_0001) {
        fn name(&self) -> String;
        fn drive(&self, km: u32);
        fn odometer(&self) -> u32;
    }
}

gem_interface! {
    /// Engine controls
    pub trait XEngine: iid(0x454e_4700_0000_0001) {
        fn start(&self);
        fn rpm(&self) -> u32;
    }
}

gem_interface! {
    /// Never implemented by anything below
    pub trait XBoat: iid(0x424f_4100_0000_0001) {}
}

struct Engine {
    rpm: AtomicU32,
}

impl XEngine for Inner<Engine> {
    fn start(&self) {
        self.rpm.store(800, Ordering::Relaxed);
    }

    fn rpm(&self) -> u32 {
        self.rpm.load(Ordering::Relaxed)
    }
}

struct Car {
    name: Mutex<String>,
    odometer: AtomicU32,
    engine: Aggregate<Engine>,
}

impl Car {
    fn new(name: &str) -> Self {
        Car {
            name: Mutex::new(name.to_string()),
            odometer: AtomicU32::new(0),
            engine: Aggregate::new(),
        }
    }
}

impl GenericBase for Car {
    fn initialize(&self, outer: OuterRef) -> GemResult<()> {
        self.engine.init(outer, Engine { rpm: AtomicU32::new(0) })?;
        log::info!("car initialized, engine aggregated");
        Ok(())
    }

    fn uninitialize(&mut self) {
        let km = self.odometer.load(Ordering::Relaxed);
        log::info!("car retired after {} km", km);
    }
}

interface_map!(Car { dyn XCar, dyn XEngine => engine });

impl XCar for Generic<Car> {
    fn name(&self) -> String {
        match self.name.lock() {
            Ok(name) => name.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn drive(&self, km: u32) {
        self.odometer.fetch_add(km, Ordering::Relaxed);
    }

    fn odometer(&self) -> u32 {
        self.odometer.load(Ordering::Relaxed)
    }
}

fn run() -> GemResult<()> {
    let mut car: GemPtr<Generic<Car>> = GemPtr::null();
    let code = Generic::create(Some(&mut car), Car::new("roadster"));
    println!("create: {}", code);
    code.ok()?;
    println!("count after create: {}", car.ref_count());

    let xcar = car.query::<dyn XCar>()?;
    println!("{}: count {}", xcar.name(), car.ref_count());

    // The inner answers for the whole object
    let engine = xcar.query::<dyn XEngine>()?;
    engine.start();
    println!("engine at {} rpm, count {}", engine.rpm(), car.ref_count());

    let back = engine.query::<dyn XCar>()?;
    back.drive(120);
    println!("odometer {} km, same object: {}", xcar.odometer(), back.ptr_eq(&xcar));

    let base = engine.query::<dyn XGeneric>()?;
    println!("base is car: {}", base.ptr_eq(&car));

    match engine.query::<dyn XBoat>() {
        Ok(_) => println!("unexpected boat"),
        Err(e) => println!("XBoat: {}", result_to_string(e.code().as_u32())),
    }

    drop((xcar, engine, back, base));
    println!("count after drops: {}", car.ref_count());

    let code = Generic::create(None, Car::new("ghost"));
    println!("create with no output: {}", code);
    if code != ResultCode::BadPointer {
        log::error!("create with no output returned {}, expected BadPointer", code);
        return Err(ResultCode::Fail.into());
    }

    drop(car);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== Gem Aggregation Example ===\n");

    if let Err(e) = run() {
        log::error!("example failed: {}", e);
        std::process::exit(1);
    }

    #[cfg(feature = "metrics")]
    {
        let snap = gem::metrics::snapshot();
        println!("\ncreated {}, destroyed {}, live {}", snap.created, snap.destroyed, snap.live());
    }

    println!("\n=== Example Complete ===");
}
