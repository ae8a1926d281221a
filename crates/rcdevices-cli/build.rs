fn main() {
    // Embed Windows version metadata next to the driver DLL
    #[cfg(target_os = "windows")]
    {
        let mut res = winresource::WindowsResource::new();

        res.set("ProductName", "RCDevices Inventory");
        res.set("FileDescription", "RCDevices programmer inventory tool");
        res.set("LegalCopyright", "RCDevices");

        if let Err(e) = res.compile() {
            eprintln!("Warning: Failed to set Windows resources: {}", e);
        }
    }
}
