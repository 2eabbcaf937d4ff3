use ptouch::{Session, SessionConfig};

fn main() {
    for identity in ptouch::discover(None).unwrap() {
        let mut session = Session::open(&identity, SessionConfig::default()).unwrap();
        let status = session.status().expect("cannot query status");
        println!("Printer:       {identity}");
        println!("Bus/Address:   {:03}/{:03}", identity.bus_number, identity.address);
        println!("Model code:    {:#04x}", status.model_code);
        println!("Tape:          {}", status.tape_width().map_or("-".into(), |t| t.to_string()));
        println!("Phase:         {:?}", status.phase());
        print!("{status}");
    }
}
