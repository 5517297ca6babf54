use core::hash::BuildHasherDefault;

use clap::Parser;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use shift_hash::Config;
use shift_hash::HashMap;
use siphasher::sip::SipHasher;

type Map = HashMap<u64, u64, BuildHasherDefault<SipHasher>>;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "target_capacity", default_value_t = 1000)]
    target_capacity: usize,

    #[arg(short = 'l', long = "load_factor", default_value_t = 0.75)]
    load_factor: f32,

    /// Fraction of entries removed again after filling, to show how
    /// backward-shift deletion keeps probe runs short.
    #[arg(short = 'r', long = "remove_fraction", default_value_t = 0.5)]
    remove_fraction: f64,
}

fn main() {
    let args = Args::parse();

    let config = Config::new(args.target_capacity, args.load_factor);
    let mut map = match Map::with_config_and_hasher(config, Default::default()) {
        Ok(map) => map,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            std::process::exit(1);
        }
    };

    println!(
        "Created map for {} entries at load factor {:.2}",
        args.target_capacity, args.load_factor
    );
    println!("Actual capacity: {}", map.capacity());

    let mut rng = SmallRng::from_os_rng();
    let num_values = map.capacity();
    for _ in 0..num_values {
        let key: u64 = rng.random();
        map.insert(key, key);
    }

    println!("Inserted {} entries", map.len());
    map.probe_histogram().print();
    map.debug_stats().print();

    let keys = map.keys().copied().collect::<Vec<_>>();
    let to_remove = (keys.len() as f64 * args.remove_fraction) as usize;
    for key in keys.into_iter().take(to_remove) {
        map.remove(&key);
    }

    println!("Removed {to_remove} entries, {} remain", map.len());
    map.probe_histogram().print();
    map.debug_stats().print();
}
