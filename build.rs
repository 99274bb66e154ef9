fn main() {
    // This crate emulates inotify on top of kqueue's EVFILT_VNODE, so it only makes sense on
    // kernels that actually expose that filter.
    match std::env::var("CARGO_CFG_TARGET_OS").unwrap().as_str() {
        "freebsd" | "dragonfly" => println!("cargo:rustc-cfg=bsd\ncargo:rustc-cfg=freebsdlike"),
        "netbsd" | "openbsd" => println!("cargo:rustc-cfg=bsd\ncargo:rustc-cfg=netbsdlike"),
        "macos" | "ios" => println!("cargo:rustc-cfg=bsd\ncargo:rustc-cfg=apple"),
        other => panic!("kqinotify does not support target OS `{}` (no EVFILT_VNODE)", other),
    }
}
